use thiserror::Error;

#[derive(Error, Debug)]
pub enum TurnError {
    #[error("Unit not found in roster: {0}")]
    UnitNotFound(crate::core::types::UnitId),

    #[error("Invalid scheduler config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TurnError>;
