use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParamsError>;

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("FORD error: {0}")]
    Ford(#[from] swatlens_ford::FordError),

    #[error("CSV file is empty: {0}")]
    EmptyCsv(PathBuf),

    #[error("Baseline CSV has no header row: {0}")]
    MissingHeader(PathBuf),
}
