use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarshalError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Schema definition error: {message}")]
    SchemaError { message: String },

    #[error("Field selection error: {message}")]
    SelectionError { message: String },

    #[error("Unknown schema: {name}")]
    UnknownSchemaError { name: String },

    #[error("Schema already registered: {name}")]
    DuplicateSchemaError { name: String },

    #[error("Failed to dump field '{field}': {reason}")]
    DumpError { field: String, reason: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
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
    Config,
    Schema,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarshalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) => ErrorCategory::Network,
            Self::TomlError(_)
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Config,
            Self::SchemaError { .. }
            | Self::SelectionError { .. }
            | Self::UnknownSchemaError { .. }
            | Self::DuplicateSchemaError { .. } => ErrorCategory::Schema,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::DumpError { .. }
            | Self::ProcessingError { .. } => ErrorCategory::Data,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
            ErrorCategory::Config | ErrorCategory::Schema | ErrorCategory::Data => {
                ErrorSeverity::High
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(_) => "Could not reach the data source endpoint.".to_string(),
            Self::TomlError(_) => "The job file could not be parsed.".to_string(),
            Self::InvalidConfigValueError { field, .. } => {
                format!("The configuration value for '{}' is invalid.", field)
            }
            Self::MissingConfigError { field } => {
                format!("The configuration is missing '{}'.", field)
            }
            Self::UnknownSchemaError { name } => {
                format!("No schema named '{}' has been registered.", name)
            }
            Self::DuplicateSchemaError { name } => {
                format!("A different schema named '{}' already exists.", name)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::Network => {
                "Check the endpoint URL and your network connection, then retry.".to_string()
            }
            ErrorCategory::Config => {
                "Review the job file against the documented format.".to_string()
            }
            ErrorCategory::Schema => {
                "Check the schema definitions and the field names they reference.".to_string()
            }
            ErrorCategory::Data => {
                "Inspect the input records; a field does not match its declaration.".to_string()
            }
            ErrorCategory::System => "Check file permissions and disk space.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarshalError>;
