use serde::{Deserialize, Serialize};

/// A field of a Fortran derived type, as documented by FORD
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FortranField {
    pub name: String,
    /// Raw Fortran type, e.g. `real` or `character(len=40)`
    pub data_type: String,
    pub default_value: Option<String>,
    pub description: Option<String>,
    pub units: Option<String>,
    pub module: Option<String>,
}

/// A Fortran derived type with its documented fields
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FortranType {
    pub name: String,
    pub module: String,
    pub fields: Vec<FortranField>,
    pub description: Option<String>,
    pub source_file: Option<String>,
}

impl FortranType {
    /// Database-backed types follow the `_db` / `_init` / `_parms` naming
    /// convention in the SWAT+ source.
    pub fn is_database_type(&self) -> bool {
        self.name.ends_with("_db") || self.name.ends_with("_init") || self.name.ends_with("_parms")
    }
}

/// Raw FORD search database layout (`search/search_database.json`)
#[derive(Debug, Deserialize)]
pub struct SearchDatabase {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub variables: Vec<SearchVariable>,
}

#[derive(Debug, Deserialize)]
pub struct SearchVariable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vartype: String,
    #[serde(default)]
    pub initial: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
}

/// Counts over all parsed types and fields
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct FieldStats {
    pub total_types: usize,
    pub total_fields: usize,
    pub fields_with_defaults: usize,
    pub fields_with_units: usize,
    pub fields_with_descriptions: usize,
}
