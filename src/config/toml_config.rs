use crate::core::{ConfigProvider, SourceKind};
use crate::domain::spec::{HarvesterInstance, HarvestSequence};
use crate::utils::error::{DqmError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    pub job: JobConfig,
    pub source: SourceConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub harvester: Vec<HarvesterConfig>,
    pub sequence: Option<SequenceConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// "file" or "http"
    pub r#type: String,
    /// File path or URL of the input DQM store
    pub location: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub store_filename: Option<String>,
    pub summary_csv: Option<bool>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

/// One `[[harvester]]` block: a directory scope plus its wire-format entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvesterConfig {
    pub name: String,
    pub subdir: String,
    pub verbose: Option<u8>,
    #[serde(default)]
    pub resolution: Vec<String>,
    #[serde(default)]
    pub efficiency: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Instance execution order; defaults to declaration order when absent.
    pub execution_order: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl HarvestConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DqmError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DqmError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DQM_STORE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        match self.source.r#type.as_str() {
            "http" => {
                crate::utils::validation::validate_url("source.location", &self.source.location)?
            }
            "file" => {
                crate::utils::validation::validate_path("source.location", &self.source.location)?
            }
            other => {
                return Err(DqmError::InvalidConfigValueError {
                    field: "source.type".to_string(),
                    value: other.to_string(),
                    reason: "Supported source types: file, http".to_string(),
                })
            }
        }

        crate::utils::validation::validate_path("output.path", &self.output.path)?;

        if self.harvester.is_empty() {
            return Err(DqmError::MissingConfigError {
                field: "harvester".to_string(),
            });
        }

        // 每個 instance 的 spec 字串都在這裡解析，收割開始前就會失敗
        for block in &self.harvester {
            block.to_instance()?.validate()?;
        }

        if let Some(sequence) = &self.sequence {
            for name in &sequence.execution_order {
                if !self.harvester.iter().any(|h| &h.name == name) {
                    return Err(DqmError::InvalidConfigValueError {
                        field: "sequence.execution_order".to_string(),
                        value: name.clone(),
                        reason: "No [[harvester]] block declares this name".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Build the executable sequence, honoring `execution_order` when given.
    pub fn to_sequence(&self) -> Result<HarvestSequence> {
        let mut sequence = HarvestSequence::new(self.job.name.clone());

        match &self.sequence {
            Some(order) => {
                for name in &order.execution_order {
                    let block = self
                        .harvester
                        .iter()
                        .find(|h| &h.name == name)
                        .ok_or_else(|| DqmError::InvalidConfigValueError {
                            field: "sequence.execution_order".to_string(),
                            value: name.clone(),
                            reason: "No [[harvester]] block declares this name".to_string(),
                        })?;
                    sequence.push(block.to_instance()?);
                }
            }
            None => {
                for block in &self.harvester {
                    sequence.push(block.to_instance()?);
                }
            }
        }

        sequence.validate()?;
        Ok(sequence)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl HarvesterConfig {
    fn to_instance(&self) -> Result<HarvesterInstance> {
        let resolution: Vec<&str> = self.resolution.iter().map(String::as_str).collect();
        let efficiency: Vec<&str> = self.efficiency.iter().map(String::as_str).collect();
        HarvesterInstance::from_strings(
            self.name.clone(),
            self.subdir.clone(),
            self.verbose.unwrap_or(0),
            &resolution,
            &efficiency,
        )
    }
}

impl ConfigProvider for HarvestConfig {
    fn input_source(&self) -> &str {
        &self.source.location
    }

    fn source_kind(&self) -> SourceKind {
        if self.source.r#type == "http" {
            SourceKind::Http
        } else {
            SourceKind::File
        }
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn store_filename(&self) -> &str {
        self.output
            .store_filename
            .as_deref()
            .unwrap_or("harvested.json")
    }

    fn summary_csv(&self) -> bool {
        self.output.summary_csv.unwrap_or(false)
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.output
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_str())
    }

    fn timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds.unwrap_or(30)
    }
}

impl Validate for HarvestConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[job]
name = "particlenet-harvest"
description = "ParticleNet trigger efficiency harvesting"
version = "1.0.0"

[source]
type = "file"
location = "./dqm_store.json"

[output]
path = "./harvest-output"
summary_csv = true

[[harvester]]
name = "ak4"
subdir = "HLT/HIG/PNETAK4/test_path"
verbose = 1
efficiency = [
    "eff_muon_pt 'Efficiency vs p_{T}(#mu); p_{T}(#mu); efficiency' muon_pt_numerator muon_pt_denominator",
]

[[harvester]]
name = "ak8"
subdir = "HLT/HIG/PNETAK8/test_path"
efficiency = [
    "eff_jet1_pt 'Efficiency vs p_{T}(j1); p_{T}(j1); efficiency' jet1_pt_numerator jet1_pt_denominator",
]
"#;

    #[test]
    fn test_parse_basic_config() {
        let config = HarvestConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.job.name, "particlenet-harvest");
        assert_eq!(config.source_kind(), SourceKind::File);
        assert_eq!(config.store_filename(), "harvested.json");
        assert!(config.summary_csv());
        assert!(config.bundle_filename().is_none());
        assert!(config.validate().is_ok());

        let sequence = config.to_sequence().unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.instances[0].name, "ak4");
        assert_eq!(sequence.instances[0].verbose, 1);
        assert_eq!(sequence.instances[1].verbose, 0);
    }

    #[test]
    fn test_execution_order_reorders_instances() {
        let content = format!(
            "{}\n[sequence]\nexecution_order = [\"ak8\", \"ak4\"]\n",
            BASIC
        );
        let config = HarvestConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_ok());

        let sequence = config.to_sequence().unwrap();
        assert_eq!(sequence.instances[0].name, "ak8");
        assert_eq!(sequence.instances[1].name, "ak4");
    }

    #[test]
    fn test_execution_order_rejects_unknown_names() {
        let content = format!(
            "{}\n[sequence]\nexecution_order = [\"nope\"]\n",
            BASIC
        );
        let config = HarvestConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
        assert!(config.to_sequence().is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_DQM_STORE", "https://dqm.example.com/store.json");

        let content = r#"
[job]
name = "env-test"
description = "test"
version = "1.0"

[source]
type = "http"
location = "${TEST_DQM_STORE}"

[output]
path = "./output"

[[harvester]]
name = "ak4"
subdir = "HLT/dir"
efficiency = [
    "eff_muon_pt 'Efficiency vs p_{T}(#mu); p_{T}(#mu); efficiency' muon_pt_numerator muon_pt_denominator",
]
"#;

        let config = HarvestConfig::from_toml_str(content).unwrap();
        assert_eq!(config.source.location, "https://dqm.example.com/store.json");
        assert_eq!(config.source_kind(), SourceKind::Http);

        std::env::remove_var("TEST_DQM_STORE");
    }

    #[test]
    fn test_malformed_spec_string_fails_validation() {
        let content = r#"
[job]
name = "bad-spec"
description = "test"
version = "1.0"

[source]
type = "file"
location = "./store.json"

[output]
path = "./output"

[[harvester]]
name = "broken"
subdir = "HLT/dir"
efficiency = ["eff_x no_quoted_title num den"]
"#;

        let config = HarvestConfig::from_toml_str(content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DqmError::SpecParseError { .. }));
    }

    #[test]
    fn test_duplicate_plot_names_fail_validation() {
        let content = r#"
[job]
name = "dup"
description = "test"
version = "1.0"

[source]
type = "file"
location = "./store.json"

[output]
path = "./output"

[[harvester]]
name = "dup"
subdir = "HLT/dir"
efficiency = [
    "eff_muon_pt 'Efficiency vs p_{T}(#mu); p_{T}(#mu); efficiency' muon_pt_numerator muon_pt_denominator",
    "eff_muon_pt 'Efficiency vs p_{T}(#mu); p_{T}(#mu); efficiency' muon_pt_numerator muon_pt_denominator",
]
"#;

        let config = HarvestConfig::from_toml_str(content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_source_type_fails() {
        let content = BASIC.replace("type = \"file\"", "type = \"ftp\"");
        let config = HarvestConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = HarvestConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.job.name, "particlenet-harvest");
    }
}
