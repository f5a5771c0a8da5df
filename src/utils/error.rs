use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Feed request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJsonError(#[from] geojson::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Feed '{feed}' unavailable: {message}")]
    FeedError { feed: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MapError::HttpError(_) | MapError::FeedError { .. } => ErrorCategory::Network,
            MapError::CsvError(_)
            | MapError::SerializationError(_)
            | MapError::GeoJsonError(_)
            | MapError::ProcessingError { .. } => ErrorCategory::Data,
            MapError::ConfigError { .. }
            | MapError::MissingConfigError { .. }
            | MapError::InvalidConfigValueError { .. }
            | MapError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            MapError::ZipError(_) | MapError::IoError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一 feed 失敗只會讓對應圖層為空
            ErrorCategory::Network => ErrorSeverity::Low,
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MapError::FeedError { feed, .. } => {
                format!("Could not load the '{}' feed; its layer will be empty", feed)
            }
            MapError::HttpError(_) => "A data feed could not be reached".to_string(),
            MapError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            MapError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            MapError::ConfigError { message }
            | MapError::ConfigValidationError { message, .. } => {
                format!("Configuration problem: {}", message)
            }
            MapError::IoError(e) => format!("Could not write map output: {}", e),
            MapError::ZipError(_) => "Could not build the output bundle".to_string(),
            other => format!("Map generation failed: {}", other),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and the feed URLs, then run again",
            ErrorCategory::Data => "Verify the feed returns a GeoJSON FeatureCollection",
            ErrorCategory::Configuration => {
                "Review the command line flags or TOML file (access token, URLs, formats)"
            }
            ErrorCategory::Storage => "Make sure the output directory is writable and has free space",
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
