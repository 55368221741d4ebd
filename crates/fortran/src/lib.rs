//! Fortran source scanning and extraction for SWAT+ analysis tools.
//!
//! Everything here is deliberately line- and regex-based: the goal is
//! reporting over a large legacy tree, not a faithful Fortran parse.

pub mod codegen;
pub mod compare;
pub mod error;
pub mod io_refs;
pub mod module_files;
pub mod normalize;
pub mod read_structure;
pub mod scanner;
pub mod trace;

pub use codegen::{generate_reader, TableReaderSpec};
pub use compare::{parse_reference_list, ListDiff, REFERENCE_FILE_LIST};
pub use error::{FortranError, Result};
pub use io_refs::{FioOccurrence, IoOp, IoRefIndex, IoRefScanner, RefLocation};
pub use module_files::{configurable_files, parse_input_files, InputFileEntry};
pub use normalize::normalize_filename;
pub use read_structure::{ReadStructureAnalyzer, ReadStructureSummary};
pub use scanner::SourceScanner;
pub use trace::{IoTrace, IoTraceGenerator};
