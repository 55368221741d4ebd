use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FortranError>;

#[derive(Error, Debug)]
pub enum FortranError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source directory not found: {0}")]
    MissingSourceDir(PathBuf),

    #[error("Module file not found: {0}")]
    MissingModuleFile(PathBuf),

    #[error("Filename '{0}' not declared in the input file module")]
    UnknownInputFile(String),

    #[error("No subroutine opens '{0}'")]
    NoReaderFound(String),

    #[error("Derived type '{type_name}' not found in {module}")]
    TypeNotFound { type_name: String, module: String },

    #[error("Invalid reader spec: {0}")]
    InvalidReaderSpec(String),
}
