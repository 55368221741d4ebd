use crate::csv::{summary_report, write_parameters_csv, write_parameters_json, write_text};
use crate::error::Result;
use crate::extractor::ParameterExtractor;
use crate::sql::SchemaGenerator;
use crate::validator;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use swatlens_ford::FordParser;

/// Configuration for one pipeline run
pub struct PipelineConfig {
    pub ford_path: PathBuf,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub reference_csv: Option<PathBuf>,
    pub database_name: String,
    pub generate_schema: bool,
    pub validate_output: bool,
}

/// Artifacts and validation outcomes of a completed run
pub struct PipelineOutcome {
    pub parameter_count: usize,
    pub csv_path: PathBuf,
    pub schema_path: Option<PathBuf>,
    pub validations: BTreeMap<String, validator::ValidationResult>,
}

impl PipelineOutcome {
    pub fn all_valid(&self) -> bool {
        self.validations.values().all(|r| r.valid)
    }
}

/// Run the five-stage pipeline: parse FORD -> extract -> CSV -> SQL ->
/// validate. Each stage fails by returning the error to the caller; there
/// is no retry or partial recovery.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    log::info!("Starting SWAT+ modular spreadsheet pipeline");
    fs::create_dir_all(&config.output_dir)?;

    // Step 1: parse FORD documentation
    log::info!("Step 1: Parsing FORD documentation...");
    let mut ford = FordParser::new(&config.ford_path);
    ford.load()?;
    log::info!("Parsed {} Fortran types", ford.types().len());

    // Step 2: extract parameters
    log::info!("Step 2: Extracting parameters...");
    let parameters = ParameterExtractor::new(&ford).extract();

    let json_path = config.output_dir.join("extracted_parameters.json");
    write_parameters_json(&parameters, &json_path)?;

    // Step 3: modular database CSV
    log::info!("Step 3: Generating modular database CSV...");
    let csv_path = config.output_dir.join("modular_database.csv");
    write_parameters_csv(&parameters, &csv_path)?;

    // Step 4: database schema
    let schema_path = if config.generate_schema {
        log::info!("Step 4: Generating database schema...");
        let generator = SchemaGenerator::new(&config.database_name);
        let path = config.output_dir.join("access_schema.sql");
        write_text(&path, &generator.generate(&parameters))?;

        let doc_path = config.output_dir.join("schema_documentation.txt");
        write_text(&doc_path, &generator.documentation(&parameters))?;
        Some(path)
    } else {
        None
    };

    // Step 5: validation
    let mut validations = BTreeMap::new();
    if config.validate_output {
        log::info!("Step 5: Validating output...");

        let structure = validator::validate_csv_structure(&csv_path)?;
        if structure.valid {
            log::info!("CSV structure validation passed");
        } else {
            log::warn!("CSV structure validation issues: {:?}", structure.errors);
        }
        validations.insert("Structure".to_string(), structure);

        if config.source_dir.exists() {
            let completeness = validator::validate_completeness(
                &csv_path,
                &config.source_dir,
                validator::CompletenessConfig::default(),
            )?;
            validations.insert("Completeness".to_string(), completeness);

            let coverage = validator::validate_coverage(&csv_path)?;
            validations.insert("Coverage".to_string(), coverage);
        } else {
            log::warn!(
                "Source directory {} not found; skipping completeness checks",
                config.source_dir.display()
            );
        }

        if let Some(reference) = &config.reference_csv {
            let comparison = validator::compare_with_reference(&csv_path, reference)?;
            log::info!(
                "Comparison with reference CSV: {}",
                comparison.statistics
            );
            let report_path = config.output_dir.join("comparison_report.json");
            write_text(&report_path, &serde_json::to_string_pretty(&comparison)?)?;
            validations.insert("Comparison".to_string(), comparison);
        }
    }

    // summary report
    let report_path = config.output_dir.join("summary_report.txt");
    write_text(&report_path, &summary_report(&parameters))?;
    log::info!("Pipeline completed; artifacts in {}", config.output_dir.display());

    Ok(PipelineOutcome {
        parameter_count: parameters.len(),
        csv_path,
        schema_path,
        validations,
    })
}

/// Write the plain-text validation report for a finished run
pub fn write_validation_report(outcome: &PipelineOutcome, path: &Path) -> Result<()> {
    write_text(path, &validator::render_report(&outcome.validations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const FORD_JSON: &str = r#"{
        "items": [
            {
                "type": "type",
                "name": "plant_db",
                "module": "plant_data_module",
                "variables": [
                    {"name": "plantnm", "vartype": "character(len=40)", "initial": "''", "doc": "none |plant name"},
                    {"name": "bio_e", "vartype": "real", "initial": "15.0", "doc": "none |biomass-energy ratio"},
                    {"name": "hvsti", "vartype": "real", "initial": "0.76", "doc": "none |harvest index"}
                ]
            }
        ]
    }"#;

    #[test]
    fn pipeline_writes_csv_with_header_and_three_rows() {
        let temp = tempdir().unwrap();
        let ford_dir = temp.path().join("ford");
        fs::create_dir_all(ford_dir.join("search")).unwrap();
        fs::write(ford_dir.join("search").join("search_database.json"), FORD_JSON).unwrap();

        let src_dir = temp.path().join("src");
        fs::create_dir_all(&src_dir).unwrap();

        let config = PipelineConfig {
            ford_path: ford_dir,
            source_dir: src_dir,
            output_dir: temp.path().join("output"),
            reference_csv: None,
            database_name: "swatplus_parameters".to_string(),
            generate_schema: true,
            validate_output: true,
        };

        let outcome = run(&config).unwrap();
        assert_eq!(outcome.parameter_count, 3);

        let csv = fs::read_to_string(&outcome.csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);

        let sql = fs::read_to_string(outcome.schema_path.as_ref().unwrap()).unwrap();
        assert!(sql.contains("CREATE TABLE plant_db ("));

        assert!(outcome.validations.contains_key("Structure"));
        assert!(outcome.validations["Structure"].valid);
    }
}
