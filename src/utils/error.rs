use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid target: {input:?} is empty after normalization")]
    InvalidTarget { input: String },

    #[error("HTTP client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value {value:?} for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Network,
    Io,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a run that failed with this severity.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl ProbeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProbeError::InvalidTarget { .. } => ErrorCategory::Input,
            ProbeError::ApiError(_) => ErrorCategory::Network,
            ProbeError::IoError(_) => ErrorCategory::Io,
            ProbeError::CsvError(_) | ProbeError::SerializationError(_) => ErrorCategory::Data,
            ProbeError::PatternError(_)
            | ProbeError::ConfigValidationError { .. }
            | ProbeError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ProbeError::InvalidTarget { .. } => {
                "Pass a host name such as example.com; scheme and path are stripped".to_string()
            }
            ProbeError::ApiError(_) => {
                "Check network connectivity and the configured family endpoint".to_string()
            }
            ProbeError::IoError(_) => {
                "Check that the wordlist and output paths exist and are writable".to_string()
            }
            ProbeError::CsvError(_) | ProbeError::SerializationError(_) => {
                "Try another output format".to_string()
            }
            ProbeError::PatternError(_) => {
                "Fix the regular expression in the [classifier] section".to_string()
            }
            ProbeError::ConfigValidationError { field, .. }
            | ProbeError::InvalidConfigValueError { field, .. } => {
                format!("Review the `{}` setting", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ProbeError::InvalidTarget { input } => {
                format!("'{}' is not a usable target", input)
            }
            ProbeError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting `{}`: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
