use serde::{Deserialize, Serialize};

/// Column order of the modular database CSV. `Data_Type` stays at index 14;
/// downstream structure checks rely on that position.
pub const CSV_COLUMNS: &[&str] = &[
    "Unique ID",
    "Broad_Classification",
    "SWAT_File",
    "database_table",
    "DATABASE_FIELD_NAME",
    "SWAT_Header_Name",
    "Text_File_Structure",
    "Position_in_File",
    "Line_in_file",
    "Swat_code type",
    "SWAT_Code_Variable_Name",
    "Description",
    "Core",
    "Units",
    "Data_Type",
    "Minimum_Range",
    "Maximum_Range",
    "Default_Value",
    "Number_Decimal_Places",
    "Primary_Key",
    "Foreign_Key",
    "Foreign_Table",
    "Foreign_Variable",
    "Doc_Path",
    "Use_in_DB",
];

/// Mapping between one Fortran field and its input-file/database locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterMapping {
    pub unique_id: u32,
    pub broad_classification: String,
    pub swat_file: String,
    pub database_table: String,
    pub database_field_name: String,
    pub swat_header_name: String,
    pub text_file_structure: String,
    pub position_in_file: u32,
    pub line_in_file: u32,
    pub swat_code_type: String,
    pub swat_code_variable_name: String,
    pub description: String,
    pub core: String,
    pub units: String,
    pub data_type: String,
    #[serde(default)]
    pub minimum_range: Option<String>,
    #[serde(default)]
    pub maximum_range: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub number_decimal_places: Option<u32>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub foreign_table: Option<String>,
    #[serde(default)]
    pub foreign_variable: Option<String>,
    #[serde(default)]
    pub doc_path: Option<String>,
    pub use_in_db: String,
}

impl ParameterMapping {
    /// Values in `CSV_COLUMNS` order
    pub fn csv_record(&self) -> Vec<String> {
        vec![
            self.unique_id.to_string(),
            self.broad_classification.clone(),
            self.swat_file.clone(),
            self.database_table.clone(),
            self.database_field_name.clone(),
            self.swat_header_name.clone(),
            self.text_file_structure.clone(),
            self.position_in_file.to_string(),
            self.line_in_file.to_string(),
            self.swat_code_type.clone(),
            self.swat_code_variable_name.clone(),
            self.description.clone(),
            self.core.clone(),
            self.units.clone(),
            self.data_type.clone(),
            self.minimum_range.clone().unwrap_or_default(),
            self.maximum_range.clone().unwrap_or_default(),
            self.default_value.clone().unwrap_or_default(),
            self.number_decimal_places
                .map(|n| n.to_string())
                .unwrap_or_default(),
            if self.primary_key { "x" } else { "" }.to_string(),
            self.foreign_key.clone().unwrap_or_default(),
            self.foreign_table.clone().unwrap_or_default(),
            self.foreign_variable.clone().unwrap_or_default(),
            self.doc_path.clone().unwrap_or_default(),
            self.use_in_db.clone(),
        ]
    }
}

/// Flat export record for the parameter JSON artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterExport {
    pub unique_id: u32,
    pub broad_classification: String,
    pub swat_file: String,
    pub database_table: String,
    pub database_field_name: String,
    pub description: String,
    pub units: String,
    pub data_type: String,
    pub default_value: Option<String>,
}

impl From<&ParameterMapping> for ParameterExport {
    fn from(param: &ParameterMapping) -> Self {
        Self {
            unique_id: param.unique_id,
            broad_classification: param.broad_classification.clone(),
            swat_file: param.swat_file.clone(),
            database_table: param.database_table.clone(),
            database_field_name: param.database_field_name.clone(),
            description: param.description.clone(),
            units: param.units.clone(),
            data_type: param.data_type.clone(),
            default_value: param.default_value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn csv_record_matches_column_count() {
        let param = ParameterMapping {
            unique_id: 1,
            broad_classification: "PLANT".to_string(),
            swat_file: "plants.plt".to_string(),
            database_table: "plant_db".to_string(),
            database_field_name: "bio_e".to_string(),
            swat_header_name: "bio_e".to_string(),
            text_file_structure: "Unique".to_string(),
            position_in_file: 1,
            line_in_file: 1,
            swat_code_type: "plant_data_module".to_string(),
            swat_code_variable_name: "bio_e".to_string(),
            description: "biomass-energy ratio".to_string(),
            core: "core".to_string(),
            units: "(kg/ha)/(MJ/m**2)".to_string(),
            data_type: "numeric".to_string(),
            minimum_range: None,
            maximum_range: None,
            default_value: Some("15.0".to_string()),
            number_decimal_places: None,
            primary_key: false,
            foreign_key: None,
            foreign_table: None,
            foreign_variable: None,
            doc_path: None,
            use_in_db: "x".to_string(),
        };

        let record = param.csv_record();
        assert_eq!(record.len(), CSV_COLUMNS.len());
        assert_eq!(record[14], "numeric");
    }
}
