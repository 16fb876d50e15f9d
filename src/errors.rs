use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::generate::GenerationError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Serialization/Deserialization error (JSON): {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

pub type AppResult<T> = Result<T, AppError>;
