use crate::error::Result;
use crate::mapping::{ParameterExport, ParameterMapping, CSV_COLUMNS};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the modular database CSV: one header line plus one row per
/// parameter, in `CSV_COLUMNS` order.
pub fn write_parameters_csv(parameters: &[ParameterMapping], output: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(CSV_COLUMNS)?;
    for param in parameters {
        writer.write_record(param.csv_record())?;
    }
    writer.flush()?;
    log::info!(
        "Wrote {} parameter rows to {}",
        parameters.len(),
        output.display()
    );
    Ok(())
}

/// Write the flat parameter export as pretty JSON
pub fn write_parameters_json(parameters: &[ParameterMapping], output: &Path) -> Result<()> {
    let exports: Vec<ParameterExport> = parameters.iter().map(ParameterExport::from).collect();
    let file = BufWriter::new(File::create(output)?);
    serde_json::to_writer_pretty(file, &exports)?;
    log::info!(
        "Exported {} parameters to {}",
        parameters.len(),
        output.display()
    );
    Ok(())
}

/// Load a CSV into raw rows (header included); used by the validations
pub fn load_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Plain-text summary of an extraction run
pub fn summary_report(parameters: &[ParameterMapping]) -> String {
    let stats = crate::extractor::extraction_stats(parameters);
    let mut out = String::new();

    out.push_str("SWAT+ Parameter Extraction Summary\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');
    out.push_str(&format!("Total parameters: {}\n", stats.total_parameters));
    out.push_str(&format!("With defaults: {}\n", stats.with_defaults));
    out.push_str(&format!("With units: {}\n", stats.with_units));
    out.push_str(&format!("With descriptions: {}\n\n", stats.with_descriptions));

    out.push_str("By classification:\n");
    for (classification, count) in &stats.by_classification {
        out.push_str(&format!("  {classification}: {count}\n"));
    }
    out.push('\n');

    out.push_str("By data type:\n");
    for (data_type, count) in &stats.by_data_type {
        out.push_str(&format!("  {data_type}: {count}\n"));
    }
    out.push('\n');

    out.push_str("By input file:\n");
    for (file, count) in &stats.by_file {
        out.push_str(&format!("  {file}: {count}\n"));
    }

    out
}

/// Convenience for writing a plain-text artifact
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ParameterMapping;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn param(id: u32, field: &str) -> ParameterMapping {
        ParameterMapping {
            unique_id: id,
            broad_classification: "PLANT".to_string(),
            swat_file: "plants.plt".to_string(),
            database_table: "plant_db".to_string(),
            database_field_name: field.to_string(),
            swat_header_name: field.to_string(),
            text_file_structure: "Unique".to_string(),
            position_in_file: 1,
            line_in_file: 1,
            swat_code_type: "plant_data_module".to_string(),
            swat_code_variable_name: field.to_string(),
            description: format!("Parameter {field} from plant_db"),
            core: "core".to_string(),
            units: "*".to_string(),
            data_type: "numeric".to_string(),
            minimum_range: None,
            maximum_range: None,
            default_value: None,
            number_decimal_places: None,
            primary_key: false,
            foreign_key: None,
            foreign_table: None,
            foreign_variable: None,
            doc_path: None,
            use_in_db: "x".to_string(),
        }
    }

    #[test]
    fn csv_has_header_plus_one_line_per_parameter() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("modular_database.csv");
        let params = vec![param(1, "plantnm"), param(2, "bio_e"), param(3, "hvsti")];

        write_parameters_csv(&params, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Unique ID,"));
        assert!(lines[1].starts_with("1,PLANT,plants.plt"));
    }

    #[test]
    fn csv_rows_round_trip_through_loader() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("modular_database.csv");
        write_parameters_csv(&[param(1, "plantnm")], &path).unwrap();

        let rows = load_csv_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "1");
        assert_eq!(rows[1][4], "plantnm");
    }
}
