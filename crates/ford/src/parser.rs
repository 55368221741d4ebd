use crate::error::{FordError, Result};
use crate::model::{
    FieldStats, FortranField, FortranType, SearchDatabase, SearchItem, SearchVariable,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Parser for FORD (Fortran Documenter) JSON output
pub struct FordParser {
    search_db_path: PathBuf,
    types: BTreeMap<String, FortranType>,
}

impl FordParser {
    /// `ford_output_path` is the FORD output directory containing
    /// `search/search_database.json`.
    pub fn new(ford_output_path: impl AsRef<Path>) -> Self {
        let search_db_path = ford_output_path
            .as_ref()
            .join("search")
            .join("search_database.json");
        Self {
            search_db_path,
            types: BTreeMap::new(),
        }
    }

    pub fn search_db_path(&self) -> &Path {
        &self.search_db_path
    }

    /// Load the search database and extract every derived type
    pub fn load(&mut self) -> Result<()> {
        if !self.search_db_path.exists() {
            return Err(FordError::MissingDatabase(self.search_db_path.clone()));
        }

        let reader = BufReader::new(File::open(&self.search_db_path)?);
        let data: SearchDatabase = serde_json::from_reader(reader)?;
        log::info!("Loaded FORD data from {}", self.search_db_path.display());

        self.types = data
            .items
            .iter()
            .filter(|item| item.item_type == "type")
            .map(|item| (item.name.clone(), parse_type(item)))
            .collect();
        log::info!("Parsed {} Fortran types", self.types.len());
        Ok(())
    }

    pub fn types(&self) -> &BTreeMap<String, FortranType> {
        &self.types
    }

    pub fn type_by_name(&self, name: &str) -> Option<&FortranType> {
        self.types.get(name)
    }

    pub fn types_by_module(&self, module: &str) -> Vec<&FortranType> {
        self.types
            .values()
            .filter(|t| t.module == module)
            .collect()
    }

    /// Types that back database tables (`_db`, `_init`, `_parms` suffixes)
    pub fn database_types(&self) -> BTreeMap<&str, &FortranType> {
        let db_types: BTreeMap<&str, &FortranType> = self
            .types
            .values()
            .filter(|t| t.is_database_type())
            .map(|t| (t.name.as_str(), t))
            .collect();
        log::info!("Found {} database types", db_types.len());
        db_types
    }

    pub fn field_stats(&self) -> FieldStats {
        let mut stats = FieldStats {
            total_types: self.types.len(),
            ..FieldStats::default()
        };
        for type_obj in self.types.values() {
            stats.total_fields += type_obj.fields.len();
            for field in &type_obj.fields {
                if field.default_value.is_some() {
                    stats.fields_with_defaults += 1;
                }
                if field.units.is_some() {
                    stats.fields_with_units += 1;
                }
                if field.description.is_some() {
                    stats.fields_with_descriptions += 1;
                }
            }
        }
        stats
    }
}

fn parse_type(item: &SearchItem) -> FortranType {
    let fields = item.variables.iter().filter_map(parse_field).collect();
    FortranType {
        name: item.name.clone(),
        module: item.module.clone(),
        fields,
        description: item.doc.clone().filter(|d| !d.is_empty()),
        source_file: item.src.clone().filter(|s| !s.is_empty()),
    }
}

fn parse_field(var: &SearchVariable) -> Option<FortranField> {
    if var.name.is_empty() {
        log::warn!("Skipping unnamed field in FORD data");
        return None;
    }
    let (description, units) = parse_doc_string(var.doc.as_deref());
    Some(FortranField {
        name: var.name.clone(),
        data_type: var.vartype.clone(),
        default_value: var.initial.clone().filter(|v| !v.is_empty()),
        description,
        units,
        module: var.module.clone(),
    })
}

/// Split a SWAT+ field comment into units and description. The convention is
/// `units      |description`; a `none` or empty units column maps to `None`.
pub fn parse_doc_string(doc: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(doc) = doc else {
        return (None, None);
    };
    if doc.is_empty() {
        return (None, None);
    }

    if let Some((units_part, desc_part)) = doc.split_once('|') {
        let units = units_part.replace('!', "");
        let units = units.trim();
        let units = if units.is_empty() || units.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(units.to_string())
        };
        let desc = desc_part.trim();
        let description = if desc.is_empty() {
            None
        } else {
            Some(desc.to_string())
        };
        (description, units)
    } else {
        let desc = doc.replace('!', "");
        let desc = desc.trim();
        if desc.is_empty() {
            (None, None)
        } else {
            (Some(desc.to_string()), None)
        }
    }
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
                "src": "plant_data_module.f90",
                "doc": "Plant database parameters",
                "variables": [
                    {
                        "name": "plantnm",
                        "vartype": "character(len=40)",
                        "initial": "''",
                        "doc": "none              |plant name",
                        "module": "plant_data_module"
                    },
                    {
                        "name": "bio_e",
                        "vartype": "real",
                        "initial": "15.0",
                        "doc": "(kg/ha)/(MJ/m**2)|biomass-energy ratio",
                        "module": "plant_data_module"
                    },
                    {
                        "name": "hvsti",
                        "vartype": "real",
                        "initial": "0.76",
                        "doc": "harvest index for optimal growing conditions",
                        "module": "plant_data_module"
                    }
                ]
            },
            {
                "type": "procedure",
                "name": "plant_read",
                "module": "plant_read_module"
            }
        ]
    }"#;

    fn fixture() -> (tempfile::TempDir, FordParser) {
        let temp = tempdir().unwrap();
        let search = temp.path().join("search");
        fs::create_dir_all(&search).unwrap();
        fs::write(search.join("search_database.json"), FORD_JSON).unwrap();
        let parser = FordParser::new(temp.path());
        (temp, parser)
    }

    #[test]
    fn parses_types_and_skips_procedures() {
        let (_temp, mut parser) = fixture();
        parser.load().unwrap();

        assert_eq!(parser.types().len(), 1);
        let plant = parser.type_by_name("plant_db").unwrap();
        assert_eq!(plant.module, "plant_data_module");
        assert_eq!(plant.fields.len(), 3);
        assert_eq!(plant.fields[0].name, "plantnm");
    }

    #[test]
    fn doc_strings_split_into_units_and_description() {
        let (desc, units) = parse_doc_string(Some("(kg/ha)/(MJ/m**2)|biomass-energy ratio"));
        assert_eq!(units.as_deref(), Some("(kg/ha)/(MJ/m**2)"));
        assert_eq!(desc.as_deref(), Some("biomass-energy ratio"));

        let (desc, units) = parse_doc_string(Some("none              |plant name"));
        assert_eq!(units, None);
        assert_eq!(desc.as_deref(), Some("plant name"));

        let (desc, units) = parse_doc_string(Some("harvest index"));
        assert_eq!(units, None);
        assert_eq!(desc.as_deref(), Some("harvest index"));

        assert_eq!(parse_doc_string(None), (None, None));
    }

    #[test]
    fn database_type_filter_uses_naming_convention() {
        let (_temp, mut parser) = fixture();
        parser.load().unwrap();

        let db_types = parser.database_types();
        assert!(db_types.contains_key("plant_db"));
    }

    #[test]
    fn field_stats_count_attributes() {
        let (_temp, mut parser) = fixture();
        parser.load().unwrap();

        let stats = parser.field_stats();
        assert_eq!(stats.total_types, 1);
        assert_eq!(stats.total_fields, 3);
        assert_eq!(stats.fields_with_defaults, 3);
        assert_eq!(stats.fields_with_units, 1);
        assert_eq!(stats.fields_with_descriptions, 3);
    }

    #[test]
    fn missing_database_is_a_typed_error() {
        let temp = tempdir().unwrap();
        let mut parser = FordParser::new(temp.path());
        let err = parser.load().unwrap_err();
        assert!(matches!(err, FordError::MissingDatabase(_)));
    }
}
