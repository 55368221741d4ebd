use crate::mapping::ParameterMapping;
use chrono::Local;
use std::collections::BTreeMap;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Generates the parameter database DDL and its documentation
pub struct SchemaGenerator {
    database_name: String,
}

impl SchemaGenerator {
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
        }
    }

    /// Full DDL: header, per-table drop/create, FK constraints, indexes
    pub fn generate(&self, parameters: &[ParameterMapping]) -> String {
        let tables = group_by_table(parameters);
        log::info!(
            "Generating schema for {} parameters across {} tables",
            parameters.len(),
            tables.len()
        );

        let mut out = String::new();
        out.push_str("-- SWAT+ Parameter Database Schema\n");
        out.push_str(&format!(
            "-- Generated: {}\n",
            Local::now().format(TIMESTAMP_FORMAT)
        ));
        out.push_str(&format!("-- Database: {}\n", self.database_name));
        out.push_str(&format!("-- Tables: {}\n\n", tables.len()));
        out.push_str(&format!(
            "CREATE DATABASE IF NOT EXISTS {};\n",
            self.database_name
        ));
        out.push_str(&format!("USE {};\n\n", self.database_name));

        for (table_name, table_params) in &tables {
            out.push_str(&table_ddl(table_name, table_params));
            out.push('\n');
        }

        let constraints = foreign_key_constraints(&tables);
        if !constraints.is_empty() {
            out.push_str("-- Foreign Key Constraints\n\n");
            for constraint in constraints {
                out.push_str(&constraint);
                out.push('\n');
            }
            out.push('\n');
        }

        let indexes = index_statements(&tables);
        if !indexes.is_empty() {
            out.push_str("-- Indexes for Performance\n\n");
            for index in indexes {
                out.push_str(&index);
                out.push('\n');
            }
        }

        out
    }

    /// Human-readable schema documentation
    pub fn documentation(&self, parameters: &[ParameterMapping]) -> String {
        let tables = group_by_table(parameters);

        let mut out = String::new();
        out.push_str("SWAT+ Database Schema Documentation\n");
        out.push_str(&"=".repeat(50));
        out.push('\n');
        out.push_str(&format!(
            "Generated: {}\n",
            Local::now().format(TIMESTAMP_FORMAT)
        ));
        out.push_str(&format!("Total Tables: {}\n", tables.len()));
        out.push_str(&format!("Total Parameters: {}\n\n", parameters.len()));

        out.push_str("Table Overview:\n");
        out.push_str(&"-".repeat(20));
        out.push('\n');
        for (table_name, table_params) in &tables {
            out.push_str(&format!(
                "  {:<30} : {:>4} parameters\n",
                table_name,
                table_params.len()
            ));
        }

        out.push_str("\nDetailed Table Definitions:\n");
        out.push_str(&"=".repeat(30));
        out.push('\n');

        for (table_name, table_params) in &tables {
            out.push_str(&format!("\nTable: {table_name}\n"));
            out.push_str(&"-".repeat(7 + table_name.len()));
            out.push('\n');
            out.push_str(&format!("Parameters: {}\n\n", table_params.len()));

            out.push_str("Columns:\n");
            for param in table_params {
                let data_type = sql_type(&param.data_type, param.default_value.as_deref());
                let default = param.default_value.as_deref().unwrap_or("NULL");
                let units = if param.units.is_empty() || param.units == "*" {
                    "none"
                } else {
                    param.units.as_str()
                };
                out.push_str(&format!(
                    "  {:<25} {:<15} Default: {:<10} Units: {:<10}\n",
                    param.database_field_name, data_type, default, units
                ));
                if !param.description.is_empty() {
                    out.push_str(&format!("    Description: {}\n", param.description));
                }
            }

            let foreign_keys: Vec<_> = table_params
                .iter()
                .filter(|p| p.foreign_key.is_some())
                .collect();
            if !foreign_keys.is_empty() {
                out.push_str("\nForeign Keys:\n");
                for fk in foreign_keys {
                    out.push_str(&format!(
                        "  {} -> {}.{}\n",
                        fk.database_field_name,
                        fk.foreign_table.as_deref().unwrap_or(""),
                        fk.foreign_variable
                            .as_deref()
                            .or(fk.foreign_key.as_deref())
                            .unwrap_or("")
                    ));
                }
            }
        }

        out
    }
}

fn group_by_table(parameters: &[ParameterMapping]) -> BTreeMap<String, Vec<&ParameterMapping>> {
    let mut tables: BTreeMap<String, Vec<&ParameterMapping>> = BTreeMap::new();
    for param in parameters {
        tables.entry(param.database_table.clone()).or_default().push(param);
    }
    tables
}

fn table_ddl(table_name: &str, parameters: &[&ParameterMapping]) -> String {
    let mut out = String::new();
    out.push_str(&format!("-- Table: {table_name}\n"));
    out.push_str(&format!("-- Parameters: {}\n", parameters.len()));
    out.push_str(&format!("DROP TABLE IF EXISTS {table_name};\n"));
    out.push_str(&format!("CREATE TABLE {table_name} (\n"));

    let primary_keys: Vec<&str> = parameters
        .iter()
        .filter(|p| p.primary_key)
        .map(|p| p.database_field_name.as_str())
        .collect();

    let mut column_lines = Vec::new();
    if primary_keys.is_empty() {
        column_lines.push(("    id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(), None));
    }
    for param in parameters {
        column_lines.push(column_definition(param, primary_keys.len() == 1));
    }
    if primary_keys.len() > 1 {
        column_lines.push((
            format!("    PRIMARY KEY ({})", primary_keys.join(", ")),
            None,
        ));
    }

    let last = column_lines.len().saturating_sub(1);
    for (i, (definition, comment)) in column_lines.iter().enumerate() {
        out.push_str(definition);
        if i != last {
            out.push(',');
        }
        if let Some(comment) = comment {
            out.push_str(&format!("  -- {comment}"));
        }
        out.push('\n');
    }

    out.push_str(");\n");
    out
}

fn column_definition(
    param: &ParameterMapping,
    single_primary_key: bool,
) -> (String, Option<String>) {
    let sql_type = sql_type(&param.data_type, param.default_value.as_deref());
    let mut parts = vec![format!("    {}", param.database_field_name), sql_type];

    if param.primary_key && single_primary_key {
        parts.push("PRIMARY KEY".to_string());
    }
    if matches!(param.database_field_name.as_str(), "name" | "id" | "code") {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = &param.default_value {
        parts.push(format!(
            "DEFAULT {}",
            format_default(default, &param.data_type)
        ));
    }

    let comment = if param.description.is_empty() {
        None
    } else {
        Some(param.description.replace('\n', " "))
    };
    (parts.join(" "), comment)
}

/// Naive CSV-type to SQL-type mapping; VARCHAR length is inferred from the
/// default value when one exists, capped at 255.
pub fn sql_type(data_type: &str, default_value: Option<&str>) -> String {
    let clean = data_type.to_lowercase();
    if clean.contains("character") || clean == "string" {
        if let Some(default) = default_value {
            let length = (default.len() * 2).max(40).min(255);
            return format!("VARCHAR({length})");
        }
        return "VARCHAR(255)".to_string();
    }
    match clean.as_str() {
        "real" | "numeric" => "DOUBLE",
        "integer" => "INTEGER",
        "logical" => "BOOLEAN",
        _ => "VARCHAR(255)",
    }
    .to_string()
}

/// Format a default value for SQL: quoted strings, validated numerics,
/// normalized booleans, `NULL` for anything unusable.
pub fn format_default(default_value: &str, data_type: &str) -> String {
    if default_value.is_empty() {
        return "NULL".to_string();
    }
    let clean = data_type.to_lowercase();

    if clean.contains("character") || clean == "string" {
        return format!("'{}'", default_value.replace('\'', "''"));
    }
    if matches!(clean.as_str(), "real" | "numeric" | "integer") {
        return if default_value.parse::<f64>().is_ok() {
            default_value.to_string()
        } else {
            "NULL".to_string()
        };
    }
    if clean == "logical" {
        return match default_value.to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | ".true." => "TRUE".to_string(),
            "false" | "f" | "0" | "no" | ".false." => "FALSE".to_string(),
            _ => "NULL".to_string(),
        };
    }
    format!("'{default_value}'")
}

fn foreign_key_constraints(tables: &BTreeMap<String, Vec<&ParameterMapping>>) -> Vec<String> {
    let mut constraints = Vec::new();
    for (table_name, parameters) in tables {
        for param in parameters {
            let (Some(foreign_key), Some(foreign_table)) =
                (param.foreign_key.as_deref(), param.foreign_table.as_deref())
            else {
                continue;
            };
            let foreign_variable = param.foreign_variable.as_deref().unwrap_or(foreign_key);
            constraints.push(format!(
                "ALTER TABLE {table_name} ADD CONSTRAINT fk_{table_name}_{field} \
                 FOREIGN KEY ({field}) REFERENCES {foreign_table}({foreign_variable});",
                field = param.database_field_name,
            ));
        }
    }
    constraints
}

fn index_statements(tables: &BTreeMap<String, Vec<&ParameterMapping>>) -> Vec<String> {
    const INDEX_FIELDS: &[&str] = &["name", "code", "id", "type", "category"];

    let mut indexes = Vec::new();
    for (table_name, parameters) in tables {
        for param in parameters {
            let field = param.database_field_name.to_lowercase();
            if INDEX_FIELDS.iter().any(|candidate| field.contains(candidate)) {
                indexes.push(format!(
                    "CREATE INDEX idx_{table_name}_{field} ON {table_name}({field});",
                    field = param.database_field_name,
                ));
            }
        }
    }
    indexes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ParameterMapping;
    use pretty_assertions::assert_eq;

    fn param(field: &str, data_type: &str, default: Option<&str>) -> ParameterMapping {
        ParameterMapping {
            unique_id: 1,
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
            description: String::new(),
            core: "core".to_string(),
            units: "*".to_string(),
            data_type: data_type.to_string(),
            minimum_range: None,
            maximum_range: None,
            default_value: default.map(str::to_string),
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
    fn synthetic_id_when_no_primary_key() {
        let generator = SchemaGenerator::new("swatplus_parameters");
        let ddl = generator.generate(&[param("bio_e", "numeric", Some("15.0"))]);

        assert!(ddl.contains("DROP TABLE IF EXISTS plant_db;"));
        assert!(ddl.contains("CREATE TABLE plant_db ("));
        assert!(ddl.contains("    id INTEGER PRIMARY KEY AUTOINCREMENT,"));
        assert!(ddl.contains("    bio_e DOUBLE DEFAULT 15.0\n"));
    }

    #[test]
    fn string_defaults_are_quoted_and_escaped() {
        assert_eq!(format_default("corn", "string"), "'corn'");
        assert_eq!(format_default("o'brien", "string"), "'o''brien'");
        assert_eq!(format_default("abc", "numeric"), "NULL");
        assert_eq!(format_default(".true.", "logical"), "TRUE");
    }

    #[test]
    fn varchar_length_inferred_from_default() {
        assert_eq!(sql_type("string", Some("x")), "VARCHAR(40)");
        assert_eq!(sql_type("string", None), "VARCHAR(255)");
        let long = "a".repeat(200);
        assert_eq!(sql_type("string", Some(&long)), "VARCHAR(255)");
    }

    #[test]
    fn name_columns_get_not_null_and_an_index() {
        let generator = SchemaGenerator::new("swatplus_parameters");
        let ddl = generator.generate(&[param("name", "string", None)]);

        assert!(ddl.contains("    name VARCHAR(255) NOT NULL"));
        assert!(ddl.contains("CREATE INDEX idx_plant_db_name ON plant_db(name);"));
    }
}
