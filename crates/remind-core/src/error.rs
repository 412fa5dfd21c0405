use thiserror::Error;

/// Top-level error type for the RemindMe system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for RemindError`
/// so that the `?` operator works seamlessly across crate boundaries.
///
/// An unparseable time phrase is NOT an error anywhere in this system; it is
/// classified data that flows through the action deriver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemindError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for RemindError {
    fn from(err: toml::de::Error) -> Self {
        RemindError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for RemindError {
    fn from(err: toml::ser::Error) -> Self {
        RemindError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RemindError {
    fn from(err: serde_json::Error) -> Self {
        RemindError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for RemindMe operations.
pub type Result<T> = std::result::Result<T, RemindError>;
