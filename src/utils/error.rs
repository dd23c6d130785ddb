use thiserror::Error;

#[derive(Error, Debug)]
pub enum DqmError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed harvest spec '{spec}': {reason}")]
    SpecParseError { spec: String, reason: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("DQM store error: {message}")]
    StoreError { message: String },

    #[error("Harvest processing error in {stage}: {details}")]
    ProcessingError { stage: String, details: String },
}

/// 錯誤分類，用於日誌與報表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Storage,
    Data,
    Processing,
}

/// 錯誤嚴重程度，決定 CLI 退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DqmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DqmError::SpecParseError { .. }
            | DqmError::ConfigValidationError { .. }
            | DqmError::InvalidConfigValueError { .. }
            | DqmError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DqmError::HttpError(_) => ErrorCategory::Network,
            DqmError::IoError(_) | DqmError::ZipError(_) => ErrorCategory::Storage,
            DqmError::SerializationError(_) | DqmError::StoreError { .. } => ErrorCategory::Data,
            DqmError::CsvError(_) | DqmError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DqmError::SpecParseError { .. }
            | DqmError::ConfigValidationError { .. }
            | DqmError::InvalidConfigValueError { .. }
            | DqmError::MissingConfigError { .. } => ErrorSeverity::High,
            DqmError::HttpError(_) => ErrorSeverity::Medium,
            DqmError::IoError(_) => ErrorSeverity::Critical,
            DqmError::ZipError(_)
            | DqmError::CsvError(_)
            | DqmError::SerializationError(_)
            | DqmError::StoreError { .. }
            | DqmError::ProcessingError { .. } => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            DqmError::ZipError(_) => {
                "Check free disk space and that the output directory is writable".to_string()
            }
            DqmError::HttpError(_) => {
                "Check the DQM source endpoint URL and network connectivity, then retry".to_string()
            }
            DqmError::CsvError(_) => {
                "The summary export failed; re-run with --verbose to locate the offending row"
                    .to_string()
            }
            DqmError::IoError(_) => {
                "Check that the input store exists and the output path is writable".to_string()
            }
            DqmError::SerializationError(_) => {
                "The DQM store file is not valid JSON; re-export it from the filling step"
                    .to_string()
            }
            DqmError::SpecParseError { .. } => {
                "Fix the spec string: expected \"name 'title; label; label' numerator denominator\""
                    .to_string()
            }
            DqmError::ConfigValidationError { field, .. }
            | DqmError::InvalidConfigValueError { field, .. } => {
                format!("Correct the '{}' entry in the harvest configuration", field)
            }
            DqmError::MissingConfigError { field } => {
                format!("Add the '{}' entry to the harvest configuration", field)
            }
            DqmError::StoreError { .. } => {
                "Inspect the DQM store contents; histogram records may be inconsistent".to_string()
            }
            DqmError::ProcessingError { .. } => {
                "Re-run with --verbose to see which harvester instance failed".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DqmError::ZipError(_) => "Could not write the harvest artifact bundle".to_string(),
            DqmError::HttpError(_) => "Could not fetch the DQM store from the source".to_string(),
            DqmError::CsvError(_) => "Could not write the efficiency summary".to_string(),
            DqmError::IoError(e) => format!("File access failed: {}", e),
            DqmError::SerializationError(_) => "The DQM store could not be decoded".to_string(),
            DqmError::SpecParseError { spec, .. } => {
                format!("Harvest spec is malformed: {}", spec)
            }
            DqmError::ConfigValidationError { field, message } => {
                format!("Configuration problem ({}): {}", field, message)
            }
            DqmError::InvalidConfigValueError { field, value, .. } => {
                format!("Configuration value '{}' is not valid for {}", value, field)
            }
            DqmError::MissingConfigError { field } => {
                format!("Configuration is missing '{}'", field)
            }
            DqmError::StoreError { message } => format!("DQM store problem: {}", message),
            DqmError::ProcessingError { stage, .. } => {
                format!("Harvesting failed during {}", stage)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DqmError>;
