//! SWAT+ parameter pipeline: FORD metadata in, CSV/SQL/NDJSON artifacts
//! out, with independent validations over the results.

pub mod csv;
pub mod error;
pub mod extractor;
pub mod mapping;
pub mod pipeline;
pub mod schema;
pub mod sql;
pub mod validator;

pub use error::{ParamsError, Result};
pub use extractor::{extraction_stats, ParameterExtractor};
pub use mapping::{ParameterExport, ParameterMapping, CSV_COLUMNS};
pub use pipeline::{run as run_pipeline, PipelineConfig, PipelineOutcome};
pub use schema::{CsvUpdater, FieldSchema};
pub use sql::SchemaGenerator;
pub use validator::{CompletenessConfig, ValidationResult};
