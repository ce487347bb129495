use thiserror::Error;

#[derive(Error, Debug)]
pub enum CareError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Weather API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid data in {source_name}: {message}")]
    DataError { source_name: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    DataSource,
    Processing,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CareError {
    pub fn data(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        CareError::DataError {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        CareError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CareError::ConfigError { .. }
            | CareError::ConfigValidationError { .. }
            | CareError::InvalidConfigValueError { .. }
            | CareError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CareError::ApiError(_)
            | CareError::CsvError(_)
            | CareError::DatabaseError(_)
            | CareError::DataError { .. } => ErrorCategory::DataSource,
            CareError::ProcessingError { .. } | CareError::SerializationError(_) => {
                ErrorCategory::Processing
            }
            CareError::ZipError(_) => ErrorCategory::Output,
            CareError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 遠端天氣服務暫時失敗，可重試
            CareError::ApiError(_) => ErrorSeverity::Medium,
            CareError::DataError { .. } | CareError::CsvError(_) | CareError::ProcessingError { .. } => {
                ErrorSeverity::High
            }
            CareError::ConfigError { .. }
            | CareError::ConfigValidationError { .. }
            | CareError::InvalidConfigValueError { .. }
            | CareError::MissingConfigError { .. } => ErrorSeverity::High,
            CareError::SerializationError(_) | CareError::ZipError(_) => ErrorSeverity::High,
            CareError::DatabaseError(_) | CareError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML configuration file against the documented sections"
            }
            ErrorCategory::DataSource => match self {
                CareError::ApiError(_) => {
                    "Verify the weather API endpoint is reachable or remove [weather_api] to use the CSV file"
                }
                CareError::DatabaseError(_) => {
                    "Verify the SQLite database path and that the residents, activity_participation and outings tables exist"
                }
                _ => "Inspect the named input file for missing columns or malformed rows",
            },
            ErrorCategory::Processing => "Re-run with --verbose to see which analysis step failed",
            ErrorCategory::Output => "Check that the report output directory is writable",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CareError::DataError { source_name, message } => {
                format!("The input data '{}' could not be used: {}", source_name, message)
            }
            CareError::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            CareError::InvalidConfigValueError { field, reason, .. } => {
                format!("The configuration value '{}' is invalid: {}", field, reason)
            }
            CareError::ApiError(_) => "Weather data could not be fetched".to_string(),
            CareError::DatabaseError(_) => "The care database could not be read".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CareError>;
