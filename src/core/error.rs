use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown state: {0}")]
    UnknownState(String),

    #[error("Duplicate state definition: {0}")]
    DuplicateState(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Duplicate action name: {0}")]
    DuplicateAction(String),

    #[error("State graph has no states")]
    EmptyStateGraph,

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
