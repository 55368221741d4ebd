use crate::csv::load_csv_rows;
use crate::error::Result;
use chrono::Local;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use swatlens_fortran::scanner::{read_source, SourceScanner};

/// Columns every modular database CSV must carry
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Unique ID",
    "Broad_Classification",
    "SWAT_File",
    "database_table",
    "DATABASE_FIELD_NAME",
    "Description",
    "Units",
    "Data_Type",
];

const ALLOWED_DATA_TYPES: &[&str] = &["string", "numeric", "integer"];
const DATA_TYPE_COLUMN: usize = 14;

/// Reporting calibration for the completeness check. The defaults reproduce
/// the long-standing review heuristics; they are not load-bearing.
#[derive(Debug, Clone, Copy)]
pub struct CompletenessConfig {
    /// Absolute floor on the expected parameter count
    pub min_expected_floor: usize,
    /// Expected parameters per derived type found in the source
    pub per_type_factor: usize,
    /// Allowed shortfall fraction before the check fails
    pub variance: f64,
}

impl Default for CompletenessConfig {
    fn default() -> Self {
        Self {
            min_expected_floor: 1000,
            per_type_factor: 5,
            variance: 0.2,
        }
    }
}

/// Outcome of one validation pass
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub statistics: serde_json::Value,
}

impl ValidationResult {
    fn pass() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            statistics: json!({}),
        }
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }
}

/// Structure check: required columns, unique IDs, allowed data types
pub fn validate_csv_structure(csv_path: &Path) -> Result<ValidationResult> {
    let mut result = ValidationResult::pass();

    let rows = load_csv_rows(csv_path)?;
    if rows.is_empty() {
        result.fail("CSV file is empty");
        return Ok(result);
    }

    let header = &rows[0];
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !header.iter().any(|h| h == *col))
        .copied()
        .collect();
    if !missing.is_empty() {
        result.fail(format!("Missing required columns: {missing:?}"));
    }

    let column_index: BTreeMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let data_rows: Vec<(usize, &Vec<String>)> = rows
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, row)| !row.is_empty() && !row[0].starts_with('#'))
        .collect();

    let mut unique_ids = BTreeSet::new();
    let mut duplicate_ids = Vec::new();
    let mut invalid_id_rows = Vec::new();
    let mut missing_fields = 0usize;
    let mut data_type_issues = Vec::new();

    for (row_idx, row) in &data_rows {
        let line = row_idx + 1;

        match row[0].parse::<u32>() {
            Ok(id) => {
                if !unique_ids.insert(id) {
                    duplicate_ids.push(id);
                }
            }
            Err(_) => invalid_id_rows.push(line),
        }

        for col in REQUIRED_COLUMNS {
            if let Some(&idx) = column_index.get(col) {
                if row.get(idx).is_some_and(|v| v.trim().is_empty()) {
                    missing_fields += 1;
                }
            }
        }

        if let Some(data_type) = row.get(DATA_TYPE_COLUMN) {
            let data_type = data_type.to_lowercase();
            if !data_type.is_empty() && !ALLOWED_DATA_TYPES.contains(&data_type.as_str()) {
                data_type_issues.push(format!("Row {line}: {data_type}"));
            }
        }
    }

    if !duplicate_ids.is_empty() {
        let sample: Vec<u32> = duplicate_ids.iter().take(5).copied().collect();
        result.fail(format!("Duplicate unique IDs: {sample:?}"));
    }
    if !invalid_id_rows.is_empty() {
        let sample: Vec<usize> = invalid_id_rows.iter().take(5).copied().collect();
        result.fail(format!("Invalid unique IDs in rows: {sample:?}"));
    }
    if missing_fields > 0 {
        result
            .warnings
            .push(format!("Missing required fields: {missing_fields} instances"));
    }

    result.statistics = json!({
        "total_rows": data_rows.len(),
        "unique_parameters": unique_ids.len(),
        "duplicate_id_count": duplicate_ids.len(),
        "missing_field_count": missing_fields,
        "data_type_issues": data_type_issues.len(),
    });

    Ok(result)
}

/// Completeness check against a rough expectation derived from the number of
/// derived types in the Fortran source.
pub fn validate_completeness(
    csv_path: &Path,
    source_dir: &Path,
    config: CompletenessConfig,
) -> Result<ValidationResult> {
    let mut result = ValidationResult::pass();

    let rows = load_csv_rows(csv_path)?;
    let generated_count = rows
        .iter()
        .skip(1)
        .filter(|row| row.first().is_some_and(|v| v.parse::<u32>().is_ok()))
        .count();

    let types_found = count_type_definitions(source_dir);
    let minimum_expected = (types_found * config.per_type_factor).max(config.min_expected_floor);

    if (generated_count as f64) < minimum_expected as f64 * (1.0 - config.variance) {
        result.fail(format!(
            "Generated parameter count ({generated_count}) is significantly below \
             expected minimum ({minimum_expected})"
        ));
    }
    if generated_count < config.min_expected_floor {
        result.warnings.push(format!(
            "Parameter count ({generated_count}) seems low for a SWAT+ model"
        ));
    }

    result.statistics = json!({
        "generated_parameters": generated_count,
        "expected_minimum": minimum_expected,
        "fortran_types_found": types_found,
        "completeness_ratio": if minimum_expected > 0 {
            generated_count as f64 / minimum_expected as f64
        } else {
            0.0
        },
    });

    Ok(result)
}

fn count_type_definitions(source_dir: &Path) -> usize {
    let mut count = 0;
    for path in SourceScanner::new(source_dir).scan() {
        match read_source(&path) {
            Ok(content) => {
                let lowered = content.to_lowercase();
                count += lowered.matches("type ::").count();
                count += lowered.matches("type,").count();
            }
            Err(e) => log::warn!("Skipping {}: {e}", path.display()),
        }
    }
    count
}

/// Coverage check: every major model component should appear among the
/// broad classifications.
pub fn validate_coverage(csv_path: &Path) -> Result<ValidationResult> {
    const EXPECTED_COMPONENTS: &[(&str, &[&str])] = &[
        ("PLANT", &["plant", "crop", "vegetation"]),
        ("SOIL", &["soil", "layer"]),
        ("HYDROLOGY", &["water", "hydro", "flow"]),
        ("CLIMATE", &["weather", "climate", "temp", "precip"]),
        ("NUTRIENTS", &["nitrogen", "phosphorus", "nutrient"]),
        ("SEDIMENT", &["sediment", "erosion"]),
        ("CHANNEL", &["channel", "stream"]),
        ("RESERVOIR", &["reservoir", "pond", "wetland"]),
        ("GROUNDWATER", &["aquifer", "groundwater", "gw"]),
        ("URBAN", &["urban", "city"]),
        ("MANAGEMENT", &["management", "tillage", "fertilizer"]),
    ];

    let mut result = ValidationResult::pass();
    let rows = load_csv_rows(csv_path)?;

    let classifications: Vec<String> = rows
        .iter()
        .skip(1)
        .filter(|row| row.len() > 1 && !row[0].starts_with('#'))
        .map(|row| row[1].clone())
        .collect();

    let mut coverage = serde_json::Map::new();
    let mut missing_components = Vec::new();
    let mut largest_component = 0usize;

    for (component, keywords) in EXPECTED_COMPONENTS {
        let found: Vec<&String> = classifications
            .iter()
            .filter(|classification| {
                let lowered = classification.to_lowercase();
                keywords.iter().any(|kw| lowered.contains(kw))
            })
            .collect();
        largest_component = largest_component.max(found.len());
        if found.is_empty() {
            missing_components.push(*component);
        }
        coverage.insert(
            component.to_string(),
            json!({ "found": !found.is_empty(), "count": found.len() }),
        );
    }

    if !missing_components.is_empty() {
        result.warnings.push(format!(
            "Missing or low coverage for components: {missing_components:?}"
        ));
    }
    if !classifications.is_empty() && largest_component > classifications.len() / 2 {
        result
            .warnings
            .push("Parameter distribution is heavily skewed towards one component".to_string());
    }

    let covered = EXPECTED_COMPONENTS.len() - missing_components.len();
    result.statistics = json!({
        "total_parameters": classifications.len(),
        "component_coverage": coverage,
        "missing_components": missing_components,
        "coverage_percentage": covered as f64 / EXPECTED_COMPONENTS.len() as f64 * 100.0,
    });

    Ok(result)
}

/// Field-name set comparison against a reference CSV. Missing more than 10 %
/// of the reference is an error; more than 20 % new names is a warning.
pub fn compare_with_reference(generated: &Path, reference: &Path) -> Result<ValidationResult> {
    let mut result = ValidationResult::pass();

    let gen_fields = field_names(generated)?;
    let ref_fields = field_names(reference)?;

    let new_fields: BTreeSet<&String> = gen_fields.difference(&ref_fields).collect();
    let missing_fields: BTreeSet<&String> = ref_fields.difference(&gen_fields).collect();
    let common_fields: BTreeSet<&String> = gen_fields.intersection(&ref_fields).collect();

    if missing_fields.len() * 10 > ref_fields.len() {
        result.fail(format!(
            "High number of missing parameters: {}",
            missing_fields.len()
        ));
    }
    if new_fields.len() * 5 > ref_fields.len() {
        result.warnings.push(format!(
            "Large number of new parameters: {}",
            new_fields.len()
        ));
    }

    let denominator = gen_fields.len().max(ref_fields.len()).max(1);
    result.statistics = json!({
        "generated_count": gen_fields.len(),
        "reference_count": ref_fields.len(),
        "new_parameters": new_fields.len(),
        "missing_parameters": missing_fields.len(),
        "common_parameters": common_fields.len(),
        "similarity_ratio": common_fields.len() as f64 / denominator as f64,
        "examples": {
            "new_fields": new_fields.iter().take(5).collect::<Vec<_>>(),
            "missing_fields": missing_fields.iter().take(5).collect::<Vec<_>>(),
        },
    });

    Ok(result)
}

/// `DATABASE_FIELD_NAME` values of a CSV, located via its header row
fn field_names(path: &Path) -> Result<BTreeSet<String>> {
    let rows = load_csv_rows(path)?;

    let Some(header_idx) = rows
        .iter()
        .position(|row| row.iter().any(|cell| cell == "DATABASE_FIELD_NAME"))
    else {
        return Ok(BTreeSet::new());
    };
    let field_col = rows[header_idx]
        .iter()
        .position(|cell| cell == "DATABASE_FIELD_NAME")
        .unwrap_or(0);

    Ok(rows
        .iter()
        .skip(header_idx + 1)
        .filter(|row| !row.is_empty() && !row[0].starts_with('#'))
        .filter_map(|row| row.get(field_col))
        .filter(|name| !name.is_empty())
        .cloned()
        .collect())
}

/// Plain-text report over a set of named validation results
pub fn render_report(results: &BTreeMap<String, ValidationResult>) -> String {
    let mut out = String::new();
    out.push_str("SWAT+ Validation Report\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');
    out.push_str(&format!(
        "Generated: {}\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    let total = results.len();
    let passed = results.values().filter(|r| r.valid).count();
    out.push_str("Overall Summary:\n");
    out.push_str(&format!("  Tests Run: {total}\n"));
    out.push_str(&format!("  Tests Passed: {passed}\n"));
    out.push_str(&format!("  Tests Failed: {}\n", total - passed));
    if total > 0 {
        out.push_str(&format!(
            "  Success Rate: {:.1}%\n",
            passed as f64 / total as f64 * 100.0
        ));
    }
    out.push('\n');

    for (name, result) in results {
        out.push_str(&format!("Test: {name}\n"));
        out.push_str(&"-".repeat(6 + name.len()));
        out.push('\n');
        out.push_str(&format!(
            "Status: {}\n\n",
            if result.valid { "PASS" } else { "FAIL" }
        ));

        if !result.errors.is_empty() {
            out.push_str("Errors:\n");
            for error in &result.errors {
                out.push_str(&format!("  - {error}\n"));
            }
            out.push('\n');
        }
        if !result.warnings.is_empty() {
            out.push_str("Warnings:\n");
            for warning in &result.warnings {
                out.push_str(&format!("  - {warning}\n"));
            }
            out.push('\n');
        }
        if let Some(stats) = result.statistics.as_object() {
            if !stats.is_empty() {
                out.push_str("Statistics:\n");
                for (key, value) in stats {
                    out.push_str(&format!("  {key}: {value}\n"));
                }
                out.push('\n');
            }
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "Unique ID,Broad_Classification,SWAT_File,database_table,DATABASE_FIELD_NAME,SWAT_Header_Name,Text_File_Structure,Position_in_File,Line_in_file,Swat_code type,SWAT_Code_Variable_Name,Description,Core,Units,Data_Type";

    fn write_csv(lines: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
        let temp = tempdir().unwrap();
        let path = temp.path().join("generated.csv");
        fs::write(&path, lines.join("\n")).unwrap();
        (temp, path)
    }

    fn data_row(id: &str, field: &str, dtype: &str) -> String {
        format!(
            "{id},PLANT,plants.plt,plant_db,{field},{field},Unique,1,1,plant_data_module,{field},desc,core,*,{dtype}"
        )
    }

    #[test]
    fn valid_csv_passes_structure_check() {
        let rows = [
            HEADER.to_string(),
            data_row("1", "plantnm", "string"),
            data_row("2", "bio_e", "numeric"),
        ];
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let (_temp, path) = write_csv(&refs);

        let result = validate_csv_structure(&path).unwrap();
        assert!(result.valid, "errors: {:?}", result.errors);
        assert_eq!(result.statistics["total_rows"], 2);
    }

    #[test]
    fn missing_required_column_is_invalid() {
        let header = HEADER.replace(",DATABASE_FIELD_NAME", ",Field");
        let rows = [header, data_row("1", "plantnm", "string")];
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let (_temp, path) = write_csv(&refs);

        let result = validate_csv_structure(&path).unwrap();
        assert!(!result.valid);
        assert!(result.errors[0].contains("Missing required columns"));
    }

    #[test]
    fn duplicate_unique_id_is_invalid() {
        let rows = [
            HEADER.to_string(),
            data_row("1", "plantnm", "string"),
            data_row("1", "bio_e", "numeric"),
        ];
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let (_temp, path) = write_csv(&refs);

        let result = validate_csv_structure(&path).unwrap();
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("Duplicate unique IDs")));
    }

    #[test]
    fn unexpected_data_type_is_counted() {
        let rows = [HEADER.to_string(), data_row("1", "plantnm", "float")];
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let (_temp, path) = write_csv(&refs);

        let result = validate_csv_structure(&path).unwrap();
        assert_eq!(result.statistics["data_type_issues"], 1);
    }

    #[test]
    fn reference_comparison_flags_large_gaps() {
        let gen_rows = [HEADER.to_string(), data_row("1", "plantnm", "string")];
        let refs: Vec<&str> = gen_rows.iter().map(String::as_str).collect();
        let (_temp1, generated) = write_csv(&refs);

        let ref_rows = [
            HEADER.to_string(),
            data_row("1", "plantnm", "string"),
            data_row("2", "bio_e", "numeric"),
            data_row("3", "hvsti", "numeric"),
        ];
        let refs: Vec<&str> = ref_rows.iter().map(String::as_str).collect();
        let (_temp2, reference) = write_csv(&refs);

        let result = compare_with_reference(&generated, &reference).unwrap();
        assert!(!result.valid);
        assert_eq!(result.statistics["missing_parameters"], 2);
        assert_eq!(result.statistics["common_parameters"], 1);
    }

    #[test]
    fn empty_csv_is_invalid() {
        let (_temp, path) = write_csv(&[]);
        let result = validate_csv_structure(&path).unwrap();
        assert!(!result.valid);
    }
}
