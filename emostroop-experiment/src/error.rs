use emostroop_core::AssetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExperimentError {
    /// The operator pressed the abort key or closed the window.
    #[error("session aborted by operator")]
    Aborted,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("asset error: {0}")]
    Assets(#[from] AssetError),

    #[error("session log error: {0}")]
    Log(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExperimentError {
    pub fn is_abort(&self) -> bool {
        matches!(self, ExperimentError::Aborted)
    }
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
