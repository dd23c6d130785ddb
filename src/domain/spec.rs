//! Harvest entry declarations: the string-encoded plot specs and the
//! instances/sequences built from them.
//!
//! Wire format of one efficiency entry:
//!
//! ```text
//! eff_muon_pt 'Efficiency vs p_{T}(#mu); p_{T}(#mu); efficiency' muon_pt_numerator muon_pt_denominator
//! ```
//!
//! First token: output plot name. Single-quoted section: title plus axis
//! labels, split on `;` and trimmed — two labels declare a 1-D plot, three a
//! 2-D plot. Remaining tokens: the input histogram names. Resolution entries
//! use the same shape with a single source histogram instead of the
//! numerator/denominator pair. Parsing happens while configurations are
//! built; a malformed string never reaches the harvesting pass.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::utils::error::{DqmError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range};

fn parse_error(spec: &str, reason: impl Into<String>) -> DqmError {
    DqmError::SpecParseError {
        spec: spec.trim().to_string(),
        reason: reason.into(),
    }
}

/// Split a raw entry into its name, quoted fields, and trailing tokens.
fn split_entry(raw: &str) -> Result<(String, Vec<String>, Vec<String>)> {
    let trimmed = raw.trim();
    let open = trimmed
        .find('\'')
        .ok_or_else(|| parse_error(raw, "missing quoted title section"))?;
    let rest = &trimmed[open + 1..];
    let close = rest
        .find('\'')
        .ok_or_else(|| parse_error(raw, "unterminated quoted title section"))?;

    let mut head = trimmed[..open].split_whitespace();
    let name = head
        .next()
        .ok_or_else(|| parse_error(raw, "missing plot name before the title"))?;
    if head.next().is_some() {
        return Err(parse_error(
            raw,
            "expected exactly one plot name before the title",
        ));
    }

    let fields = rest[..close]
        .split(';')
        .map(|f| f.trim().to_string())
        .collect();
    let tail = rest[close + 1..]
        .split_whitespace()
        .map(str::to_string)
        .collect();

    Ok((name.to_string(), fields, tail))
}

fn check_token(field: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field, value)?;
    if value.contains(char::is_whitespace) || value.contains('\'') {
        return Err(DqmError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be a single unquoted token".to_string(),
        });
    }
    Ok(())
}

fn check_text(field: &str, value: &str) -> Result<()> {
    if value.contains('\'') || value.contains(';') {
        return Err(DqmError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: "cannot contain quote or semicolon characters".to_string(),
        });
    }
    Ok(())
}

/// One efficiency entry: divide `numerator` by `denominator`, publish the
/// ratio under `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EfficiencySpec {
    pub name: String,
    pub title: String,
    /// Axis labels: `[x, value]` for 1-D plots, `[x, y, value]` for 2-D.
    pub labels: Vec<String>,
    pub numerator: String,
    pub denominator: String,
}

impl EfficiencySpec {
    pub fn parse(raw: &str) -> Result<Self> {
        let (name, mut fields, tail) = split_entry(raw)?;

        if !(3..=4).contains(&fields.len()) {
            return Err(parse_error(
                raw,
                format!(
                    "expected a title plus 2 or 3 axis labels, got {} quoted fields",
                    fields.len()
                ),
            ));
        }
        let title = fields.remove(0);

        if tail.len() != 2 {
            return Err(parse_error(
                raw,
                format!(
                    "expected numerator and denominator histogram names after the title, got {} tokens",
                    tail.len()
                ),
            ));
        }
        let mut tail = tail.into_iter();

        Ok(Self {
            name,
            title,
            labels: fields,
            numerator: tail.next().unwrap_or_default(),
            denominator: tail.next().unwrap_or_default(),
        })
    }

    /// Output dimensionality implied by the label count.
    pub fn dimensions(&self) -> usize {
        self.labels.len() - 1
    }

    pub fn validate(&self) -> Result<()> {
        check_token("efficiency.name", &self.name)?;
        check_token("efficiency.numerator", &self.numerator)?;
        check_token("efficiency.denominator", &self.denominator)?;
        if self.numerator == self.denominator {
            return Err(DqmError::InvalidConfigValueError {
                field: "efficiency.denominator".to_string(),
                value: self.denominator.clone(),
                reason: format!(
                    "numerator and denominator of '{}' must be distinct histograms",
                    self.name
                ),
            });
        }
        if !(2..=3).contains(&self.labels.len()) {
            return Err(DqmError::InvalidConfigValueError {
                field: "efficiency.labels".to_string(),
                value: self.labels.len().to_string(),
                reason: format!("'{}' must declare 2 (1-D) or 3 (2-D) axis labels", self.name),
            });
        }
        check_text("efficiency.title", &self.title)?;
        for label in &self.labels {
            check_text("efficiency.labels", label)?;
            validate_non_empty_string("efficiency.labels", label)?;
        }
        Ok(())
    }
}

impl fmt::Display for EfficiencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}; {}' {} {}",
            self.name,
            self.title,
            self.labels.join("; "),
            self.numerator,
            self.denominator
        )
    }
}

/// One resolution entry: per-column mean/sigma profiles of a 2-D `source`,
/// published as `<name>_mean` and `<name>_sigma`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSpec {
    pub name: String,
    pub title: String,
    /// Axis labels: `[x, value]`.
    pub labels: Vec<String>,
    pub source: String,
}

impl ResolutionSpec {
    pub fn parse(raw: &str) -> Result<Self> {
        let (name, mut fields, tail) = split_entry(raw)?;

        if fields.len() != 3 {
            return Err(parse_error(
                raw,
                format!(
                    "expected a title plus 2 axis labels, got {} quoted fields",
                    fields.len()
                ),
            ));
        }
        let title = fields.remove(0);

        if tail.len() != 1 {
            return Err(parse_error(
                raw,
                format!(
                    "expected one source histogram name after the title, got {} tokens",
                    tail.len()
                ),
            ));
        }

        Ok(Self {
            name,
            title,
            labels: fields,
            source: tail.into_iter().next().unwrap_or_default(),
        })
    }

    pub fn mean_plot(&self) -> String {
        format!("{}_mean", self.name)
    }

    pub fn sigma_plot(&self) -> String {
        format!("{}_sigma", self.name)
    }

    pub fn validate(&self) -> Result<()> {
        check_token("resolution.name", &self.name)?;
        check_token("resolution.source", &self.source)?;
        if self.labels.len() != 2 {
            return Err(DqmError::InvalidConfigValueError {
                field: "resolution.labels".to_string(),
                value: self.labels.len().to_string(),
                reason: format!("'{}' must declare exactly 2 axis labels", self.name),
            });
        }
        check_text("resolution.title", &self.title)?;
        for label in &self.labels {
            check_text("resolution.labels", label)?;
            validate_non_empty_string("resolution.labels", label)?;
        }
        Ok(())
    }
}

impl fmt::Display for ResolutionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}; {}' {}",
            self.name,
            self.title,
            self.labels.join("; "),
            self.source
        )
    }
}

/// One harvester instance: a directory scope plus the entries to harvest in
/// it. Mirrors one generic-client block of the upstream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvesterInstance {
    pub name: String,
    pub subdir: String,
    /// 0 quiet, 1 reports skipped entries, 2 traces every published object.
    pub verbose: u8,
    pub resolution: Vec<ResolutionSpec>,
    pub efficiency: Vec<EfficiencySpec>,
}

impl HarvesterInstance {
    /// Build an instance from wire-format entry strings.
    pub fn from_strings(
        name: impl Into<String>,
        subdir: impl Into<String>,
        verbose: u8,
        resolution: &[&str],
        efficiency: &[&str],
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            subdir: subdir.into(),
            verbose,
            resolution: resolution
                .iter()
                .map(|raw| ResolutionSpec::parse(raw))
                .collect::<Result<_>>()?,
            efficiency: efficiency
                .iter()
                .map(|raw| EfficiencySpec::parse(raw))
                .collect::<Result<_>>()?,
        })
    }

    /// Every plot name this instance would publish, in declaration order.
    pub fn published_plots(&self) -> Vec<String> {
        let mut plots: Vec<String> = self.efficiency.iter().map(|e| e.name.clone()).collect();
        for res in &self.resolution {
            plots.push(res.mean_plot());
            plots.push(res.sigma_plot());
        }
        plots
    }

    pub fn validate(&self) -> Result<()> {
        validate_non_empty_string("harvester.name", &self.name)?;
        validate_non_empty_string("harvester.subdir", &self.subdir)?;
        validate_range("harvester.verbose", self.verbose, 0, 2)?;
        for spec in &self.efficiency {
            spec.validate()?;
        }
        for spec in &self.resolution {
            spec.validate()?;
        }

        let mut seen = HashSet::new();
        for plot in self.published_plots() {
            if !seen.insert(plot.clone()) {
                return Err(DqmError::InvalidConfigValueError {
                    field: "harvester.efficiency".to_string(),
                    value: plot,
                    reason: format!("duplicate output plot name in instance '{}'", self.name),
                });
            }
        }
        Ok(())
    }
}

/// An ordered set of harvester instances run as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestSequence {
    pub name: String,
    pub instances: Vec<HarvesterInstance>,
}

impl HarvestSequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instances: Vec::new(),
        }
    }

    pub fn push(&mut self, instance: HarvesterInstance) {
        self.instances.push(instance);
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        validate_non_empty_string("sequence.name", &self.name)?;
        let mut seen = HashSet::new();
        for instance in &self.instances {
            instance.validate()?;
            if !seen.insert(instance.name.as_str()) {
                return Err(DqmError::InvalidConfigValueError {
                    field: "sequence.instances".to_string(),
                    value: instance.name.clone(),
                    reason: "duplicate harvester instance name in sequence".to_string(),
                });
            }
        }
        Ok(())
    }
}
