use thiserror::Error;

#[derive(Error, Debug)]
pub enum GradebookError {
    #[error("Student {id} already exists")]
    DuplicateKey { id: String },

    #[error("Student {id} not found")]
    NotFound { id: String },

    #[error("No scores recorded for {subject}")]
    EmptySet { subject: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("TSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The request was rejected; nothing was changed.
    Low,
    /// Input data could not be used.
    Medium,
    /// Configuration problem; the tool cannot start.
    High,
    /// Storage or filesystem failure.
    Critical,
}

impl GradebookError {
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DuplicateKey { .. } | Self::NotFound { .. } | Self::EmptySet { .. } => {
                ErrorSeverity::Low
            }
            Self::InvalidValue { .. } | Self::CsvError(_) | Self::SerializationError(_) => {
                ErrorSeverity::Medium
            }
            Self::ConfigValidationError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorSeverity::High
            }
            Self::DatabaseError(_) | Self::IoError(_) | Self::ZipError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::DuplicateKey { id } => {
                format!("Use `update` to change student {} or pick a new ID", id)
            }
            Self::NotFound { .. } => "Run `list` to see the stored student IDs".to_string(),
            Self::EmptySet { .. } => "Import or add students with this subject first".to_string(),
            Self::InvalidValue { .. } => {
                "Scores must be non-negative numbers; dates use M-D-YYYY".to_string()
            }
            Self::CsvError(_) => "Check that the file is tab-separated with a header row".to_string(),
            Self::ConfigValidationError { .. } | Self::InvalidConfigValueError { .. } => {
                "Review the configuration file or CLI flags".to_string()
            }
            Self::DatabaseError(_) => "Check that the database file is writable and not corrupted".to_string(),
            Self::IoError(_) | Self::ZipError(_) => "Check file paths and permissions".to_string(),
            Self::SerializationError(_) => "Report this as a bug".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "The student database could not be accessed".to_string(),
            other => other.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 3,
            ErrorSeverity::Critical => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, GradebookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_low_severity() {
        assert_eq!(GradebookError::not_found("1").severity(), ErrorSeverity::Low);
        assert_eq!(
            GradebookError::DuplicateKey { id: "1".into() }.severity(),
            ErrorSeverity::Low
        );
        assert_eq!(
            GradebookError::invalid_value("Math", "abc", "not a number").severity(),
            ErrorSeverity::Medium
        );
    }

    #[test]
    fn test_error_messages() {
        let err = GradebookError::invalid_value("Math", "abc", "not a number");
        assert_eq!(err.to_string(), "Invalid value 'abc' for Math: not a number");
        assert_eq!(err.exit_code(), 2);
        assert!(GradebookError::not_found("42").to_string().contains("42"));
    }
}
