use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FordError>;

#[derive(Error, Debug)]
pub enum FordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid FORD JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("FORD search database not found: {0}")]
    MissingDatabase(PathBuf),
}
