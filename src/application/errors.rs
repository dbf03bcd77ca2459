//! Application layer errors

use thiserror::Error;

use crate::domain::entities::EventKind;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Handler not ready: {0}")]
    NotReady(String),
}

impl From<BotError> for CommandError {
    fn from(e: BotError) -> Self {
        CommandError::ExecutionFailed(e.to_string())
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Event emitter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    #[error("No listener {id} registered for '{kind}'")]
    UnknownListener { kind: EventKind, id: u64 },
}

/// Every listener removal that failed during one teardown pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} listener(s) could not be removed: {}", .failures.len(), summary(.failures))]
pub struct TeardownError {
    pub failures: Vec<EmitterError>,
}

fn summary(failures: &[EmitterError]) -> String {
    failures.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; ")
}

/// Extension lifecycle errors
#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("Teardown failed for '{name}': {source}")]
    Teardown {
        name: String,
        #[source]
        source: TeardownError,
    },

    #[error("Extension '{0}' is disabled")]
    Disabled(String),

    #[error("Failed to load '{name}': {reason}")]
    Load { name: String, reason: String },
}
