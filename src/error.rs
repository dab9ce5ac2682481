use thiserror::Error;

/// Errors surfaced by the library. Everything else is clamped locally.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("no wall definitions found for level {0}")]
    UnknownLevel(u32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml_ng::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type GameResult<T> = Result<T, GameError>;
