use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::utils::error::{DqmError, Result};

/// A uniformly binned histogram axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Axis label as rendered on the published plot.
    pub label: String,
    /// Number of bins (excluding under/overflow, which the store does not keep).
    pub bins: usize,
    /// Lower edge of the first bin.
    pub low: f64,
    /// Upper edge of the last bin.
    pub high: f64,
}

impl Axis {
    pub fn new(label: impl Into<String>, bins: usize, low: f64, high: f64) -> Self {
        Self {
            label: label.into(),
            bins,
            low,
            high,
        }
    }

    pub fn bin_width(&self) -> f64 {
        (self.high - self.low) / self.bins as f64
    }

    pub fn bin_center(&self, index: usize) -> f64 {
        self.low + (index as f64 + 0.5) * self.bin_width()
    }

    fn same_binning(&self, other: &Axis) -> bool {
        self.bins == other.bins && self.low == other.low && self.high == other.high
    }
}

/// A monitored histogram: 1-D when `y` is absent, 2-D otherwise.
///
/// 2-D bin contents are stored row-major: `index = iy * x.bins + ix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Histogram name, unique within its directory.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// The binned x axis.
    pub x: Axis,
    /// The binned y axis, present only for 2-D histograms.
    #[serde(default)]
    pub y: Option<Axis>,
    /// Label of the content axis (the y-title of a 1-D plot, the z-title of a 2-D plot).
    #[serde(default)]
    pub value_label: String,
    /// Bin contents, length `x.bins` (1-D) or `x.bins * y.bins` (2-D).
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin, if stored; per-bin error is `sqrt(sumw2[i])`.
    #[serde(default)]
    pub sumw2: Option<Vec<f64>>,
    /// Total number of entries.
    #[serde(default)]
    pub entries: f64,
}

impl Histogram {
    /// A zero-filled 1-D histogram.
    pub fn new_1d(name: impl Into<String>, title: impl Into<String>, x: Axis) -> Self {
        let bins = x.bins;
        Self {
            name: name.into(),
            title: title.into(),
            x,
            y: None,
            value_label: String::new(),
            bin_content: vec![0.0; bins],
            sumw2: None,
            entries: 0.0,
        }
    }

    /// A zero-filled 2-D histogram.
    pub fn new_2d(name: impl Into<String>, title: impl Into<String>, x: Axis, y: Axis) -> Self {
        let cells = x.bins * y.bins;
        Self {
            name: name.into(),
            title: title.into(),
            x,
            y: Some(y),
            value_label: String::new(),
            bin_content: vec![0.0; cells],
            sumw2: None,
            entries: 0.0,
        }
    }

    /// 1 or 2.
    pub fn dimensions(&self) -> usize {
        if self.y.is_some() {
            2
        } else {
            1
        }
    }

    /// Number of stored cells.
    pub fn n_cells(&self) -> usize {
        match &self.y {
            Some(y) => self.x.bins * y.bins,
            None => self.x.bins,
        }
    }

    /// Flat index of a 2-D cell.
    pub fn bin_index(&self, ix: usize, iy: usize) -> usize {
        iy * self.x.bins + ix
    }

    /// Per-bin error: `sqrt(sumw2)` when stored, Poisson `sqrt(content)` otherwise.
    pub fn bin_error(&self, index: usize) -> f64 {
        match &self.sumw2 {
            Some(w2) => w2[index].max(0.0).sqrt(),
            None => self.bin_content[index].max(0.0).sqrt(),
        }
    }

    /// Check that `other` can be combined bin-by-bin with `self`.
    pub fn compatible_with(&self, other: &Histogram) -> std::result::Result<(), String> {
        if self.dimensions() != other.dimensions() {
            return Err(format!(
                "dimensionality mismatch: {}-D vs {}-D",
                self.dimensions(),
                other.dimensions()
            ));
        }
        if !self.x.same_binning(&other.x) {
            return Err(format!(
                "x axis mismatch: {} bins [{}, {}] vs {} bins [{}, {}]",
                self.x.bins, self.x.low, self.x.high, other.x.bins, other.x.low, other.x.high
            ));
        }
        if let (Some(a), Some(b)) = (&self.y, &other.y) {
            if !a.same_binning(b) {
                return Err(format!(
                    "y axis mismatch: {} bins [{}, {}] vs {} bins [{}, {}]",
                    a.bins, a.low, a.high, b.bins, b.low, b.high
                ));
            }
        }
        Ok(())
    }

    fn validate_shape(&self) -> Result<()> {
        let shape_error = |message: String| DqmError::StoreError { message };

        if self.name.is_empty() {
            return Err(shape_error("histogram has an empty name".to_string()));
        }
        for axis in std::iter::once(&self.x).chain(self.y.iter()) {
            if axis.bins == 0 || axis.low >= axis.high {
                return Err(shape_error(format!(
                    "'{}' has a degenerate axis: {} bins in [{}, {}]",
                    self.name, axis.bins, axis.low, axis.high
                )));
            }
        }
        if self.bin_content.len() != self.n_cells() {
            return Err(shape_error(format!(
                "'{}' stores {} bins but its axes imply {}",
                self.name,
                self.bin_content.len(),
                self.n_cells()
            )));
        }
        if let Some(w2) = &self.sumw2 {
            if w2.len() != self.bin_content.len() {
                return Err(shape_error(format!(
                    "'{}' has {} sumw2 entries for {} bins",
                    self.name,
                    w2.len(),
                    self.bin_content.len()
                )));
            }
        }
        Ok(())
    }
}

/// The monitored directory tree: directory path -> histogram name -> histogram.
///
/// Directory paths are normalized (trailing `/` stripped) on both insert and
/// lookup, matching the upstream convention of writing scopes with a trailing
/// slash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DqmStore {
    histograms: BTreeMap<String, BTreeMap<String, Histogram>>,
}

impl DqmStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize_dir(dir: &str) -> &str {
        dir.trim_end_matches('/')
    }

    /// Book a histogram under `dir`. Booking over an existing name is an
    /// error; published objects are immutable once stored.
    pub fn insert(&mut self, dir: &str, histogram: Histogram) -> Result<()> {
        histogram.validate_shape()?;
        let dir = Self::normalize_dir(dir);
        let entry = self.histograms.entry(dir.to_string()).or_default();
        if entry.contains_key(&histogram.name) {
            return Err(DqmError::StoreError {
                message: format!("'{}/{}' is already booked", dir, histogram.name),
            });
        }
        entry.insert(histogram.name.clone(), histogram);
        Ok(())
    }

    pub fn get(&self, dir: &str, name: &str) -> Option<&Histogram> {
        self.histograms
            .get(Self::normalize_dir(dir))
            .and_then(|m| m.get(name))
    }

    pub fn contains_dir(&self, dir: &str) -> bool {
        self.histograms.contains_key(Self::normalize_dir(dir))
    }

    /// Histograms booked under `dir`, in name order.
    pub fn histograms_in(&self, dir: &str) -> impl Iterator<Item = &Histogram> {
        self.histograms
            .get(Self::normalize_dir(dir))
            .into_iter()
            .flat_map(|m| m.values())
    }

    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.histograms.keys().map(String::as_str)
    }

    /// Total number of stored histograms across all directories.
    pub fn len(&self) -> usize {
        self.histograms.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a store from its JSON representation, re-normalizing directory
    /// paths and rejecting inconsistent records.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: DqmStore = serde_json::from_slice(data)?;
        let mut store = DqmStore::new();
        for (dir, entries) in raw.histograms {
            for (key, histogram) in entries {
                if key != histogram.name {
                    return Err(DqmError::StoreError {
                        message: format!(
                            "store key '{}/{}' does not match histogram name '{}'",
                            dir, key, histogram.name
                        ),
                    });
                }
                store.insert(&dir, histogram)?;
            }
        }
        Ok(store)
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Why a configured entry produced no output object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingNumerator(String),
    MissingDenominator(String),
    MissingSource(String),
    Incompatible(String),
    AlreadyBooked,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingNumerator(name) => {
                write!(f, "numerator histogram '{}' not found", name)
            }
            SkipReason::MissingDenominator(name) => {
                write!(f, "denominator histogram '{}' not found", name)
            }
            SkipReason::MissingSource(name) => {
                write!(f, "source histogram '{}' not found", name)
            }
            SkipReason::Incompatible(reason) => write!(f, "{}", reason),
            SkipReason::AlreadyBooked => write!(f, "output plot is already booked"),
        }
    }
}

/// Per-entry harvest outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecOutcome {
    /// The plot was published. For efficiency entries `efficiency` carries the
    /// aggregate ratio (total numerator / total denominator); resolution
    /// profiles carry `None`.
    Published {
        plot: String,
        efficiency: Option<f64>,
    },
    /// The entry was skipped; harvesting continued with the next one.
    Skipped { plot: String, reason: SkipReason },
}

impl SpecOutcome {
    pub fn plot(&self) -> &str {
        match self {
            SpecOutcome::Published { plot, .. } | SpecOutcome::Skipped { plot, .. } => plot,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, SpecOutcome::Published { .. })
    }
}

/// What one harvester instance did to the store.
#[derive(Debug, Clone)]
pub struct InstanceReport {
    pub instance: String,
    pub subdir: String,
    pub outcomes: Vec<SpecOutcome>,
    pub duration: Duration,
}

impl InstanceReport {
    pub fn published(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_published()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.published()
    }
}

/// Output of the transform phase: the augmented store plus bookkeeping.
#[derive(Debug, Clone)]
pub struct HarvestResult {
    pub store: DqmStore,
    pub reports: Vec<InstanceReport>,
    pub summary_csv: String,
}
