//! Error types for Geoflow

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoflowError {
    // Transport errors
    #[error("Transport failure while {context}: {reason}")]
    Transport { context: String, reason: String },

    #[error("Remote service responded with {status}: {body}")]
    RemoteResponse { status: u16, body: String },

    // Job errors
    #[error("Job {job_id} failed{}", format_messages(.messages))]
    JobFailed {
        job_id: String,
        messages: Vec<String>,
    },

    #[error("Print job did not complete after {attempts} status checks")]
    PrintTimeout { attempts: u32 },

    #[error("Job polling was cancelled")]
    Cancelled,

    // Reference system errors
    #[error("Unknown reference system: {code}")]
    UnknownReferenceSystem { code: String },

    #[error("Cannot transform from {from} to {to}: {reason}")]
    UnsupportedTransform {
        from: String,
        to: String,
        reason: String,
    },

    // Scale errors
    #[error("No meters-per-unit definition for the active projection")]
    MissingUnitDefinition,

    #[error("Invalid scale table: {reason}")]
    InvalidScaleTable { reason: String },

    // Input errors
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeoflowError {
    /// Shorthand for an input validation error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        GeoflowError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a transport error
    pub fn transport(context: impl Into<String>, reason: impl ToString) -> Self {
        GeoflowError::Transport {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether a polling loop may retry after this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GeoflowError::Transport { .. }
                | GeoflowError::RemoteResponse { .. }
                | GeoflowError::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for GeoflowError {
    fn from(err: serde_json::Error) -> Self {
        GeoflowError::Serialization(err.to_string())
    }
}

fn format_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        String::new()
    } else {
        format!(": {}", messages.join("; "))
    }
}

pub type Result<T> = std::result::Result<T, GeoflowError>;
