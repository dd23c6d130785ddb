pub mod cli;
pub mod toml_config;

use crate::core::{ConfigProvider, SourceKind};
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_url, Validate};

#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "small-dqm"))]
#[cfg_attr(
    feature = "cli",
    command(about = "DQM harvesting tool for ParticleNet trigger efficiencies")
)]
pub struct CliConfig {
    /// Input DQM store: a JSON file path, or an http(s) URL to fetch it from
    #[cfg_attr(feature = "cli", arg(long, default_value = "dqm_store.json"))]
    pub input: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = "./output"))]
    pub output_path: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = "harvested.json"))]
    pub store_filename: String,

    /// Write the per-plot efficiency summary CSV next to the store
    #[cfg_attr(feature = "cli", arg(long))]
    pub summary_csv: bool,

    /// Zip the output artifacts into this bundle filename
    #[cfg_attr(feature = "cli", arg(long))]
    pub bundle: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, default_value = "30"))]
    pub timeout_seconds: u64,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable system monitoring"))]
    pub monitor: bool,
}

impl CliConfig {
    fn is_http_source(&self) -> bool {
        self.input.starts_with("http://") || self.input.starts_with("https://")
    }
}

impl ConfigProvider for CliConfig {
    fn input_source(&self) -> &str {
        &self.input
    }

    fn source_kind(&self) -> SourceKind {
        if self.is_http_source() {
            SourceKind::Http
        } else {
            SourceKind::File
        }
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn store_filename(&self) -> &str {
        &self.store_filename
    }

    fn summary_csv(&self) -> bool {
        self.summary_csv
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.is_http_source() {
            validate_url("input", &self.input)?;
        } else {
            validate_path("input", &self.input)?;
        }
        validate_path("output_path", &self.output_path)?;
        validate_path("store_filename", &self.store_filename)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(input: &str) -> CliConfig {
        CliConfig {
            input: input.to_string(),
            output_path: "./output".to_string(),
            store_filename: "harvested.json".to_string(),
            summary_csv: false,
            bundle: None,
            timeout_seconds: 30,
            verbose: false,
            monitor: false,
        }
    }

    #[test]
    fn test_source_kind_is_inferred_from_input() {
        assert_eq!(config("store.json").source_kind(), SourceKind::File);
        assert_eq!(
            config("https://dqm.example.com/store.json").source_kind(),
            SourceKind::Http
        );
    }

    #[test]
    fn test_validation_rejects_malformed_url() {
        assert!(config("https://dqm example com").validate().is_err());
        assert!(config("store.json").validate().is_ok());
    }
}
