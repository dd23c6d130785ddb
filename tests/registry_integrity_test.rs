//! Data-integrity checks over the built-in ParticleNet harvest registry.

use small_dqm::client::particlenet::{
    ak4_btag_efficiency, ak8_hbb_efficiency, particlenet_client, AK4_EFFICIENCY, AK4_SUBDIR,
    AK8_EFFICIENCY, AK8_SUBDIR,
};
use small_dqm::domain::spec::{EfficiencySpec, HarvesterInstance};
use std::collections::HashSet;

/// Plot names that map a quantity against a second one, published as 2-D
/// efficiency maps. Everything else in the registry is a 1-D curve.
fn expected_two_dim(instance: &HarvesterInstance) -> HashSet<&str> {
    instance
        .efficiency
        .iter()
        .filter(|spec| {
            spec.name.contains("_pt_eta")
                || spec.name.contains("_pt_pnetscore")
                || spec.name.contains("_pt_mean2pnetscore")
        })
        .map(|spec| spec.name.as_str())
        .collect()
}

#[test]
fn test_numerator_and_denominator_are_distinct_non_empty() {
    for instance in [ak4_btag_efficiency().unwrap(), ak8_hbb_efficiency().unwrap()] {
        for spec in &instance.efficiency {
            assert!(!spec.numerator.is_empty(), "{} has empty numerator", spec.name);
            assert!(!spec.denominator.is_empty(), "{} has empty denominator", spec.name);
            assert_ne!(
                spec.numerator, spec.denominator,
                "{} divides a histogram by itself",
                spec.name
            );
        }
    }
}

#[test]
fn test_label_count_matches_dimensionality_implied_by_name() {
    for instance in [ak4_btag_efficiency().unwrap(), ak8_hbb_efficiency().unwrap()] {
        let two_dim = expected_two_dim(&instance);
        for spec in &instance.efficiency {
            let expected = if two_dim.contains(spec.name.as_str()) { 3 } else { 2 };
            assert_eq!(
                spec.labels.len(),
                expected,
                "{} declares {} labels, expected {}",
                spec.name,
                spec.labels.len(),
                expected
            );
        }
    }

    // 2-D maps: 14 in AK4, 3 in AK8
    assert_eq!(expected_two_dim(&ak4_btag_efficiency().unwrap()).len(), 14);
    assert_eq!(expected_two_dim(&ak8_hbb_efficiency().unwrap()).len(), 3);
}

#[test]
fn test_no_duplicate_plot_names_within_an_instance() {
    for instance in [ak4_btag_efficiency().unwrap(), ak8_hbb_efficiency().unwrap()] {
        let plots = instance.published_plots();
        let unique: HashSet<&String> = plots.iter().collect();
        assert_eq!(plots.len(), unique.len(), "duplicate plots in {}", instance.name);
        assert!(instance.validate().is_ok());
    }
}

#[test]
fn test_muon_pt_entry_parses_to_documented_fields() {
    let instance = ak4_btag_efficiency().unwrap();
    let spec = instance
        .efficiency
        .iter()
        .find(|s| s.name == "eff_muon_pt")
        .unwrap();

    assert_eq!(spec.title, "Efficiency vs p_{T}(#mu)");
    assert_eq!(spec.labels, vec!["p_{T}(#mu)", "efficiency"]);
    assert_eq!(spec.numerator, "muon_pt_numerator");
    assert_eq!(spec.denominator, "muon_pt_denominator");
}

#[test]
fn test_sequence_has_two_instances_with_distinct_subdirectories() {
    let sequence = particlenet_client().unwrap();
    assert_eq!(sequence.len(), 2);
    assert_eq!(sequence.instances[0].subdir, AK4_SUBDIR);
    assert_eq!(sequence.instances[1].subdir, AK8_SUBDIR);
    assert_ne!(sequence.instances[0].subdir, sequence.instances[1].subdir);
    assert!(sequence.validate().is_ok());
}

#[test]
fn test_every_registry_entry_round_trips() {
    let tables = [
        (ak4_btag_efficiency().unwrap(), AK4_EFFICIENCY),
        (ak8_hbb_efficiency().unwrap(), AK8_EFFICIENCY),
    ];
    for (instance, raws) in tables {
        assert_eq!(instance.efficiency.len(), raws.len());
        for (spec, raw) in instance.efficiency.iter().zip(raws) {
            // Display 必須逐字重現宣告的 wire 字串，parse 則是它的反函數
            assert_eq!(spec.to_string(), *raw, "{} does not render verbatim", spec.name);
            let reparsed = EfficiencySpec::parse(raw).unwrap();
            assert_eq!(&reparsed, spec, "{} does not round-trip", spec.name);
        }
    }
}

#[test]
fn test_ht_and_njets_are_separate_entries() {
    // The two entries must not be fused into one malformed spec
    for instance in [ak4_btag_efficiency().unwrap(), ak8_hbb_efficiency().unwrap()] {
        let names: HashSet<&str> = instance.efficiency.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains("eff_ht"));
        assert!(names.contains("eff_njets"));
    }
}
