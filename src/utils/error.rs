use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Network error for {identifier}: {source}")]
    NetworkError {
        identifier: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} for {identifier}")]
    HttpStatusError { identifier: String, status: u16 },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Failed to load page {location}: {message}")]
    PageLoadError { location: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EnrichError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrichError::NetworkError { .. }
            | EnrichError::HttpStatusError { .. }
            | EnrichError::PageLoadError { .. } => ErrorCategory::Network,
            EnrichError::ParseError { .. } | EnrichError::SerializationError(_) => {
                ErrorCategory::Data
            }
            EnrichError::ConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EnrichError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆刊登失敗不影響整體流程
            EnrichError::NetworkError { .. }
            | EnrichError::HttpStatusError { .. }
            | EnrichError::ParseError { .. } => ErrorSeverity::Low,
            EnrichError::PageLoadError { .. } => ErrorSeverity::Medium,
            EnrichError::ConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. }
            | EnrichError::SerializationError(_) => ErrorSeverity::High,
            EnrichError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 是否只影響單一刊登（pipeline 會記錄後繼續）
    pub fn is_listing_scoped(&self) -> bool {
        matches!(
            self,
            EnrichError::NetworkError { .. }
                | EnrichError::HttpStatusError { .. }
                | EnrichError::ParseError { .. }
        )
    }

    /// Short machine-friendly label used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            EnrichError::NetworkError { .. } => "network",
            EnrichError::HttpStatusError { .. } => "http_status",
            EnrichError::ParseError { .. } => "parse",
            EnrichError::PageLoadError { .. } => "page_load",
            EnrichError::IoError(_) => "io",
            EnrichError::SerializationError(_) => "serialization",
            EnrichError::ConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. } => "config",
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EnrichError::NetworkError { .. } => {
                "Check network connectivity or raise --timeout-secs".to_string()
            }
            EnrichError::HttpStatusError { status, .. } if *status == 429 => {
                "The endpoint is throttling requests; raise --delay-ms".to_string()
            }
            EnrichError::HttpStatusError { .. } => {
                "The listing may have been removed; it will be retried on the next run".to_string()
            }
            EnrichError::ParseError { .. } => {
                "The endpoint response shape may have changed; run with --verbose".to_string()
            }
            EnrichError::PageLoadError { .. } => {
                "Verify the page URL or input file path".to_string()
            }
            EnrichError::IoError(_) => "Check file permissions and disk space".to_string(),
            EnrichError::SerializationError(_) => {
                "Report output could not be encoded; check the report path".to_string()
            }
            EnrichError::ConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EnrichError::NetworkError { identifier, .. } => {
                format!("Could not reach the insights endpoint for {}", identifier)
            }
            EnrichError::HttpStatusError { identifier, status } => {
                format!("Insights endpoint returned {} for {}", status, identifier)
            }
            EnrichError::ParseError { message } => format!("Unexpected data: {}", message),
            EnrichError::PageLoadError { location, .. } => {
                format!("Could not load page {}", location)
            }
            EnrichError::IoError(e) => format!("File operation failed: {}", e),
            EnrichError::SerializationError(e) => format!("Could not write report: {}", e),
            EnrichError::ConfigError { message } => format!("Configuration problem: {}", message),
            EnrichError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            EnrichError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;
