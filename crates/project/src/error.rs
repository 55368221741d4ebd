use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProjectError>;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project path does not exist: {0}")]
    MissingProject(PathBuf),

    #[error("HRU {0} not found in model")]
    UnknownHru(u32),
}
