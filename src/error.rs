use thiserror::Error;

/// Errors surfaced by the dashboard library.
#[derive(Debug, Error)]
pub enum DashError {
    /// Raised at startup: missing or malformed palette, bad settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid field '{0}'")]
    InvalidField(String),

    #[error("failed to load dataset from {origin}: {reason}")]
    DatasetLoad { origin: String, reason: String },

    #[error("unknown control '{0}'")]
    UnknownControl(String),
}

impl DashError {
    pub fn dataset_load(origin: impl Into<String>, reason: impl ToString) -> Self {
        DashError::DatasetLoad {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
