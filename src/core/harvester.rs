//! The generic harvester: divides configured numerator/denominator pairs into
//! efficiency plots and derives mean/sigma profiles for resolution entries.
//!
//! Every per-entry failure is non-fatal. A missing or incompatible input
//! skips that entry, records the reason in the instance report, and moves on;
//! the overall harvesting pass never aborts because one plot could not be
//! produced.

use std::time::Instant;

use crate::domain::model::{
    Axis, DqmStore, Histogram, InstanceReport, SkipReason, SpecOutcome,
};
use crate::domain::spec::{EfficiencySpec, HarvesterInstance, ResolutionSpec};

#[derive(Debug, Default)]
pub struct GenericHarvester;

impl GenericHarvester {
    pub fn new() -> Self {
        Self
    }

    /// Run one harvester instance against the store, publishing its plots
    /// under the instance's subdirectory.
    pub fn run(&self, instance: &HarvesterInstance, store: &mut DqmStore) -> InstanceReport {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(instance.efficiency.len() + instance.resolution.len());

        for spec in &instance.efficiency {
            let outcome = self.harvest_efficiency(instance, spec, store);
            Self::log_outcome(instance, &outcome);
            outcomes.push(outcome);
        }

        for spec in &instance.resolution {
            let outcome = self.harvest_resolution(instance, spec, store);
            Self::log_outcome(instance, &outcome);
            outcomes.push(outcome);
        }

        InstanceReport {
            instance: instance.name.clone(),
            subdir: instance.subdir.clone(),
            outcomes,
            duration: start.elapsed(),
        }
    }

    fn harvest_efficiency(
        &self,
        instance: &HarvesterInstance,
        spec: &EfficiencySpec,
        store: &mut DqmStore,
    ) -> SpecOutcome {
        let skip = |reason: SkipReason| SpecOutcome::Skipped {
            plot: spec.name.clone(),
            reason,
        };

        if store.get(&instance.subdir, &spec.name).is_some() {
            return skip(SkipReason::AlreadyBooked);
        }

        let numerator = match store.get(&instance.subdir, &spec.numerator) {
            Some(h) => h.clone(),
            None => return skip(SkipReason::MissingNumerator(spec.numerator.clone())),
        };
        let denominator = match store.get(&instance.subdir, &spec.denominator) {
            Some(h) => h.clone(),
            None => return skip(SkipReason::MissingDenominator(spec.denominator.clone())),
        };

        if let Err(reason) = numerator.compatible_with(&denominator) {
            return skip(SkipReason::Incompatible(reason));
        }
        if spec.dimensions() != denominator.dimensions() {
            return skip(SkipReason::Incompatible(format!(
                "spec declares {} axis labels ({}-D) but the inputs are {}-D",
                spec.labels.len(),
                spec.dimensions(),
                denominator.dimensions()
            )));
        }

        let (ratio, aggregate) = Self::divide(spec, &numerator, &denominator);
        if let Err(e) = store.insert(&instance.subdir, ratio) {
            return skip(SkipReason::Incompatible(e.to_string()));
        }

        SpecOutcome::Published {
            plot: spec.name.clone(),
            efficiency: aggregate,
        }
    }

    /// Bin-wise numerator/denominator ratio with binomial errors.
    ///
    /// Zero-denominator bins publish the 0/0 sentinel instead of failing the
    /// entry. The binomial variance `eff(1-eff)/den` is clamped at zero so a
    /// numerator exceeding its denominator cannot produce NaN errors.
    fn divide(
        spec: &EfficiencySpec,
        numerator: &Histogram,
        denominator: &Histogram,
    ) -> (Histogram, Option<f64>) {
        let cells = denominator.n_cells();
        let mut bin_content = vec![0.0; cells];
        let mut sumw2 = vec![0.0; cells];
        let mut num_total = 0.0;
        let mut den_total = 0.0;

        for i in 0..cells {
            let n = numerator.bin_content[i];
            let d = denominator.bin_content[i];
            num_total += n;
            den_total += d;
            if d > 0.0 {
                let eff = n / d;
                bin_content[i] = eff;
                sumw2[i] = (eff * (1.0 - eff) / d).max(0.0);
            }
        }

        let ratio = Histogram {
            name: spec.name.clone(),
            title: spec.title.clone(),
            x: Axis {
                label: spec.labels[0].clone(),
                ..denominator.x.clone()
            },
            y: denominator.y.clone().map(|y| Axis {
                label: spec.labels[1].clone(),
                ..y
            }),
            value_label: spec.labels.last().cloned().unwrap_or_default(),
            bin_content,
            sumw2: Some(sumw2),
            entries: denominator.entries,
        };

        let aggregate = (den_total > 0.0).then(|| num_total / den_total);
        (ratio, aggregate)
    }

    fn harvest_resolution(
        &self,
        instance: &HarvesterInstance,
        spec: &ResolutionSpec,
        store: &mut DqmStore,
    ) -> SpecOutcome {
        let skip = |reason: SkipReason| SpecOutcome::Skipped {
            plot: spec.name.clone(),
            reason,
        };

        if store.get(&instance.subdir, &spec.mean_plot()).is_some()
            || store.get(&instance.subdir, &spec.sigma_plot()).is_some()
        {
            return skip(SkipReason::AlreadyBooked);
        }

        let source = match store.get(&instance.subdir, &spec.source) {
            Some(h) => h.clone(),
            None => return skip(SkipReason::MissingSource(spec.source.clone())),
        };
        let y_axis = match &source.y {
            Some(y) => y.clone(),
            None => {
                return skip(SkipReason::Incompatible(format!(
                    "resolution source '{}' is 1-D, expected a 2-D distribution",
                    spec.source
                )))
            }
        };

        let (mean, sigma) = Self::column_profiles(&source, &y_axis);
        let profile = |name: String, bin_content: Vec<f64>| Histogram {
            name,
            title: spec.title.clone(),
            x: Axis {
                label: spec.labels[0].clone(),
                ..source.x.clone()
            },
            y: None,
            value_label: spec.labels[1].clone(),
            bin_content,
            sumw2: None,
            entries: source.entries,
        };

        if let Err(e) = store.insert(&instance.subdir, profile(spec.mean_plot(), mean)) {
            return skip(SkipReason::Incompatible(e.to_string()));
        }
        if let Err(e) = store.insert(&instance.subdir, profile(spec.sigma_plot(), sigma)) {
            return skip(SkipReason::Incompatible(e.to_string()));
        }

        SpecOutcome::Published {
            plot: spec.name.clone(),
            efficiency: None,
        }
    }

    /// Weighted mean and RMS of the y distribution in each x column.
    /// Empty columns publish the 0/0 sentinel.
    fn column_profiles(source: &Histogram, y_axis: &Axis) -> (Vec<f64>, Vec<f64>) {
        let nx = source.x.bins;
        let mut mean = vec![0.0; nx];
        let mut sigma = vec![0.0; nx];

        for ix in 0..nx {
            let mut sum_w = 0.0;
            let mut sum_wy = 0.0;
            let mut sum_wy2 = 0.0;
            for iy in 0..y_axis.bins {
                let w = source.bin_content[source.bin_index(ix, iy)];
                if w <= 0.0 {
                    continue;
                }
                let center = y_axis.bin_center(iy);
                sum_w += w;
                sum_wy += w * center;
                sum_wy2 += w * center * center;
            }
            if sum_w > 0.0 {
                let m = sum_wy / sum_w;
                mean[ix] = m;
                sigma[ix] = (sum_wy2 / sum_w - m * m).max(0.0).sqrt();
            }
        }

        (mean, sigma)
    }

    fn log_outcome(instance: &HarvesterInstance, outcome: &SpecOutcome) {
        match outcome {
            SpecOutcome::Skipped { plot, reason } if instance.verbose >= 1 => {
                tracing::warn!("⏭️ [{}] skipped '{}': {}", instance.name, plot, reason);
            }
            SpecOutcome::Published { plot, .. } if instance.verbose >= 2 => {
                tracing::info!("📤 [{}] published '{}'", instance.name, plot);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::spec::HarvesterInstance;

    const SUBDIR: &str = "HLT/HIG/PNETAK4/test_path";

    fn hist_1d(name: &str, content: Vec<f64>) -> Histogram {
        let bins = content.len();
        let mut h = Histogram::new_1d(name, "", Axis::new("p_{T}", bins, 0.0, bins as f64));
        h.bin_content = content;
        h.entries = 100.0;
        h
    }

    fn instance(specs: &[&str]) -> HarvesterInstance {
        HarvesterInstance::from_strings("test", SUBDIR, 0, &[], specs).unwrap()
    }

    fn eff_instance() -> HarvesterInstance {
        instance(&[
            "eff_muon_pt 'Efficiency vs p_{T}(#mu); p_{T}(#mu); efficiency' muon_pt_numerator muon_pt_denominator",
        ])
    }

    #[test]
    fn test_ratio_and_binomial_errors() {
        let mut store = DqmStore::new();
        store
            .insert(SUBDIR, hist_1d("muon_pt_numerator", vec![5.0, 10.0, 0.0]))
            .unwrap();
        store
            .insert(SUBDIR, hist_1d("muon_pt_denominator", vec![10.0, 10.0, 4.0]))
            .unwrap();

        let report = GenericHarvester::new().run(&eff_instance(), &mut store);
        assert_eq!(report.published(), 1);
        assert_eq!(report.skipped(), 0);

        let ratio = store.get(SUBDIR, "eff_muon_pt").unwrap();
        assert_eq!(ratio.title, "Efficiency vs p_{T}(#mu)");
        assert_eq!(ratio.x.label, "p_{T}(#mu)");
        assert_eq!(ratio.value_label, "efficiency");
        assert_eq!(ratio.bin_content, vec![0.5, 1.0, 0.0]);

        // 二項式誤差: sqrt(eff * (1 - eff) / den)
        let expected = (0.5_f64 * 0.5 / 10.0).sqrt();
        assert!((ratio.bin_error(0) - expected).abs() < 1e-12);
        // eff = 1 的 bin 誤差為 0
        assert_eq!(ratio.bin_error(1), 0.0);

        match &report.outcomes[0] {
            SpecOutcome::Published { efficiency, .. } => {
                assert!((efficiency.unwrap() - 15.0 / 24.0).abs() < 1e-12);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_zero_denominator_bins_publish_sentinel() {
        let mut store = DqmStore::new();
        store
            .insert(SUBDIR, hist_1d("muon_pt_numerator", vec![3.0, 0.0]))
            .unwrap();
        store
            .insert(SUBDIR, hist_1d("muon_pt_denominator", vec![0.0, 0.0]))
            .unwrap();

        let report = GenericHarvester::new().run(&eff_instance(), &mut store);
        assert_eq!(report.published(), 1);

        let ratio = store.get(SUBDIR, "eff_muon_pt").unwrap();
        assert_eq!(ratio.bin_content, vec![0.0, 0.0]);
        assert_eq!(ratio.bin_error(0), 0.0);

        match &report.outcomes[0] {
            SpecOutcome::Published { efficiency, .. } => assert!(efficiency.is_none()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_efficiency_above_one_clamps_variance() {
        let mut store = DqmStore::new();
        store
            .insert(SUBDIR, hist_1d("muon_pt_numerator", vec![12.0]))
            .unwrap();
        store
            .insert(SUBDIR, hist_1d("muon_pt_denominator", vec![10.0]))
            .unwrap();

        GenericHarvester::new().run(&eff_instance(), &mut store);

        let ratio = store.get(SUBDIR, "eff_muon_pt").unwrap();
        assert_eq!(ratio.bin_content, vec![1.2]);
        assert_eq!(ratio.bin_error(0), 0.0);
        assert!(!ratio.bin_error(0).is_nan());
    }

    #[test]
    fn test_missing_inputs_skip_without_abort() {
        let mut store = DqmStore::new();
        store
            .insert(SUBDIR, hist_1d("muon_pt_denominator", vec![1.0]))
            .unwrap();
        // muon_eta 兩個輸入都齊全
        store
            .insert(SUBDIR, hist_1d("muon_eta_numerator", vec![1.0]))
            .unwrap();
        store
            .insert(SUBDIR, hist_1d("muon_eta_denominator", vec![2.0]))
            .unwrap();

        let instance = instance(&[
            "eff_muon_pt 'Efficiency vs p_{T}(#mu); p_{T}(#mu); efficiency' muon_pt_numerator muon_pt_denominator",
            "eff_muon_eta 'Efficiency vs #eta(#mu); #eta(#mu); efficiency' muon_eta_numerator muon_eta_denominator",
        ]);

        let report = GenericHarvester::new().run(&instance, &mut store);
        assert_eq!(report.published(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(
            report.outcomes[0],
            SpecOutcome::Skipped {
                plot: "eff_muon_pt".to_string(),
                reason: SkipReason::MissingNumerator("muon_pt_numerator".to_string()),
            }
        );
        assert!(store.get(SUBDIR, "eff_muon_eta").is_some());
    }

    #[test]
    fn test_incompatible_binning_skips() {
        let mut store = DqmStore::new();
        store
            .insert(SUBDIR, hist_1d("muon_pt_numerator", vec![1.0, 2.0]))
            .unwrap();
        store
            .insert(SUBDIR, hist_1d("muon_pt_denominator", vec![1.0, 2.0, 3.0]))
            .unwrap();

        let report = GenericHarvester::new().run(&eff_instance(), &mut store);
        assert_eq!(report.published(), 0);
        match &report.outcomes[0] {
            SpecOutcome::Skipped {
                reason: SkipReason::Incompatible(msg),
                ..
            } => assert!(msg.contains("x axis")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_label_count_must_match_input_dimensionality() {
        let mut store = DqmStore::new();
        // 1-D 輸入配上 2-D 規格
        store
            .insert(SUBDIR, hist_1d("jet1_pt_eta_numerator", vec![1.0]))
            .unwrap();
        store
            .insert(SUBDIR, hist_1d("jet1_pt_eta_denominator", vec![2.0]))
            .unwrap();

        let instance = instance(&[
            "eff_jet1_pt_eta 'Efficiency vs j1 p_{T} and #eta; p_{T}(j1); #eta(j1); efficiency' jet1_pt_eta_numerator jet1_pt_eta_denominator",
        ]);

        let report = GenericHarvester::new().run(&instance, &mut store);
        assert_eq!(report.published(), 0);
        match &report.outcomes[0] {
            SpecOutcome::Skipped {
                reason: SkipReason::Incompatible(msg),
                ..
            } => assert!(msg.contains("axis labels")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_two_dim_ratio_carries_labels() {
        let x = Axis::new("pt", 2, 0.0, 100.0);
        let y = Axis::new("eta", 3, -3.0, 3.0);
        let mut num = Histogram::new_2d("jet1_pt_eta_numerator", "", x.clone(), y.clone());
        num.bin_content = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut den = Histogram::new_2d("jet1_pt_eta_denominator", "", x, y);
        den.bin_content = vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0];

        let mut store = DqmStore::new();
        store.insert(SUBDIR, num).unwrap();
        store.insert(SUBDIR, den).unwrap();

        let instance = instance(&[
            "eff_jet1_pt_eta 'Efficiency vs j1 p_{T} and #eta; p_{T}(j1); #eta(j1); efficiency' jet1_pt_eta_numerator jet1_pt_eta_denominator",
        ]);
        let report = GenericHarvester::new().run(&instance, &mut store);
        assert_eq!(report.published(), 1);

        let ratio = store.get(SUBDIR, "eff_jet1_pt_eta").unwrap();
        assert_eq!(ratio.dimensions(), 2);
        assert_eq!(ratio.x.label, "p_{T}(j1)");
        assert_eq!(ratio.y.as_ref().unwrap().label, "#eta(j1)");
        assert_eq!(ratio.value_label, "efficiency");
        assert!(ratio.bin_content.iter().all(|&v| (v - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let mut store = DqmStore::new();
        store
            .insert(SUBDIR, hist_1d("muon_pt_numerator", vec![5.0]))
            .unwrap();
        store
            .insert(SUBDIR, hist_1d("muon_pt_denominator", vec![10.0]))
            .unwrap();

        GenericHarvester::new().run(&eff_instance(), &mut store);

        assert_eq!(
            store.get(SUBDIR, "muon_pt_numerator").unwrap().bin_content,
            vec![5.0]
        );
        assert_eq!(
            store.get(SUBDIR, "muon_pt_denominator").unwrap().bin_content,
            vec![10.0]
        );
    }

    #[test]
    fn test_rerun_skips_already_booked_plots() {
        let mut store = DqmStore::new();
        store
            .insert(SUBDIR, hist_1d("muon_pt_numerator", vec![5.0]))
            .unwrap();
        store
            .insert(SUBDIR, hist_1d("muon_pt_denominator", vec![10.0]))
            .unwrap();

        let harvester = GenericHarvester::new();
        let first = harvester.run(&eff_instance(), &mut store);
        assert_eq!(first.published(), 1);

        let second = harvester.run(&eff_instance(), &mut store);
        assert_eq!(second.published(), 0);
        assert_eq!(
            second.outcomes[0],
            SpecOutcome::Skipped {
                plot: "eff_muon_pt".to_string(),
                reason: SkipReason::AlreadyBooked,
            }
        );
        // 原輸出不被覆寫
        assert_eq!(
            store.get(SUBDIR, "eff_muon_pt").unwrap().bin_content,
            vec![0.5]
        );
    }

    #[test]
    fn test_resolution_profiles() {
        let x = Axis::new("pt", 2, 0.0, 2.0);
        let y = Axis::new("response", 4, 0.0, 4.0);
        let mut source = Histogram::new_2d("jet_response_vs_pt", "", x, y);
        // 第 0 欄: 全部權重集中在第二個 y bin (center 1.5)
        let i = source.bin_index(0, 1);
        source.bin_content[i] = 10.0;
        // 第 1 欄: 權重平分在 center 0.5 和 center 3.5
        let i = source.bin_index(1, 0);
        source.bin_content[i] = 5.0;
        let i = source.bin_index(1, 3);
        source.bin_content[i] = 5.0;

        let mut store = DqmStore::new();
        store.insert(SUBDIR, source).unwrap();

        let instance = HarvesterInstance::from_strings(
            "res",
            SUBDIR,
            0,
            &["res_jet_response 'Jet response vs p_{T}; p_{T}(jet); response' jet_response_vs_pt"],
            &[],
        )
        .unwrap();

        let report = GenericHarvester::new().run(&instance, &mut store);
        assert_eq!(report.published(), 1);

        let mean = store.get(SUBDIR, "res_jet_response_mean").unwrap();
        assert_eq!(mean.x.label, "p_{T}(jet)");
        assert!((mean.bin_content[0] - 1.5).abs() < 1e-12);
        assert!((mean.bin_content[1] - 2.0).abs() < 1e-12);

        let sigma = store.get(SUBDIR, "res_jet_response_sigma").unwrap();
        assert!((sigma.bin_content[0] - 0.0).abs() < 1e-12);
        assert!((sigma.bin_content[1] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_resolution_rejects_one_dim_source() {
        let mut store = DqmStore::new();
        store
            .insert(SUBDIR, hist_1d("jet_response_vs_pt", vec![1.0]))
            .unwrap();

        let instance = HarvesterInstance::from_strings(
            "res",
            SUBDIR,
            0,
            &["res_jet_response 'Jet response vs p_{T}; p_{T}(jet); response' jet_response_vs_pt"],
            &[],
        )
        .unwrap();

        let report = GenericHarvester::new().run(&instance, &mut store);
        assert_eq!(report.published(), 0);
        match &report.outcomes[0] {
            SpecOutcome::Skipped {
                reason: SkipReason::Incompatible(msg),
                ..
            } => assert!(msg.contains("2-D")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
