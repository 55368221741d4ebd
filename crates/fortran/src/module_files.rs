use crate::error::{FortranError, Result};
use crate::scanner::read_source;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One configurable input file declared in `input_file_module.f90`
#[derive(Debug, Clone, Serialize)]
pub struct InputFileEntry {
    /// Fully qualified variable, e.g. `in_con%hru`
    pub variable: String,
    /// Default filename, e.g. `hru.con`
    pub filename: String,
    /// Owning derived type, e.g. `input_con`
    pub group: String,
}

static TYPE_INSTANCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)type\s*\((\w+)\)\s*::\s*(\w+)").expect("valid regex"));
static TYPE_BEGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*type\s+(\w+)\s*$").expect("valid regex"));
static TYPE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*end\s*type\b").expect("valid regex"));
static FILENAME_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)character\(len=\d+\)\s*::\s*(\w+)\s*=\s*"([^"]+)""#).expect("valid regex")
});

/// Parse the input file module, returning every `variable -> filename`
/// declaration in source order. Types whose names mention `path` are
/// skipped; commented-out fields are skipped.
pub fn parse_input_files(module_path: &Path) -> Result<Vec<InputFileEntry>> {
    if !module_path.exists() {
        return Err(FortranError::MissingModuleFile(module_path.to_path_buf()));
    }
    let content = read_source(module_path)?;

    // instance declarations give the variable prefix per type
    let mut type_to_var: BTreeMap<String, String> = BTreeMap::new();
    for caps in TYPE_INSTANCE.captures_iter(&content) {
        type_to_var.insert(caps[1].to_lowercase(), caps[2].to_string());
    }

    let mut entries = Vec::new();
    let mut current_type: Option<String> = None;

    for line in content.lines() {
        if let Some(caps) = TYPE_BEGIN.captures(line) {
            let name = caps[1].to_lowercase();
            current_type = if name.contains("path") {
                None
            } else {
                Some(name)
            };
            continue;
        }
        if TYPE_END.is_match(line) {
            current_type = None;
            continue;
        }
        let Some(type_name) = &current_type else {
            continue;
        };
        if line.trim_start().starts_with('!') {
            continue;
        }
        if let Some(caps) = FILENAME_FIELD.captures(line) {
            let prefix = type_to_var
                .get(type_name)
                .map(String::as_str)
                .unwrap_or("unknown");
            entries.push(InputFileEntry {
                variable: format!("{prefix}%{}", &caps[1]),
                filename: caps[2].to_string(),
                group: type_name.clone(),
            });
        }
    }

    log::info!(
        "Parsed {} input file declarations from {}",
        entries.len(),
        module_path.display()
    );
    Ok(entries)
}

/// The set of filenames configurable through the input file module,
/// lowercased for comparison against hardcoded literals.
pub fn configurable_files(module_path: &Path) -> Result<BTreeSet<String>> {
    if !module_path.exists() {
        return Err(FortranError::MissingModuleFile(module_path.to_path_buf()));
    }
    let content = read_source(module_path)?;
    Ok(FILENAME_FIELD
        .captures_iter(&content)
        .map(|caps| caps[2].trim().to_lowercase())
        .collect())
}

/// Human title for a derived type grouping in the listing report
pub fn group_title(type_name: &str) -> &str {
    match type_name {
        "input_sim" => "Simulation Files",
        "input_basin" => "Basin Files",
        "input_cli" => "Climate Files",
        "input_con" => "Connection Files",
        "input_cha" => "Channel Files",
        "input_res" => "Reservoir Files",
        "input_ru" => "Routing Unit Files",
        "input_hru" => "HRU Files",
        "input_exco" => "External Constant (Recall Constant) Files",
        "input_rec" => "Recall Files",
        "input_delr" => "Delivery Ratio Files",
        "input_aqu" => "Aquifer Files",
        "input_herd" => "Herd/Animal Files",
        "input_water_rights" => "Water Rights Files",
        "input_link" => "Link Files",
        "input_hydrology" => "Hydrology Files",
        "input_structural" => "Structural Files",
        "input_parameter_databases" => "Parameter Database Files",
        "input_ops" => "Operation Scheduling Files",
        "input_lum" => "Land Use Management Files",
        "input_chg" => "Calibration Files",
        "input_init" => "Initial Condition Files",
        "input_soils" => "Soil Files",
        "input_condition" => "Conditional/Decision Table Files",
        "input_regions" => "Region Definition Files",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const MODULE: &str = "\
      module input_file_module
      implicit none

      type input_con
        character(len=25) :: hru = \"hru.con\"
        character(len=25) :: ru = \"rout_unit.con\"
        !character(len=25) :: mfl = \"modflow.con\"
      end type input_con
      type (input_con) :: in_con

      type input_path
        character(len=25) :: weather = \"weather/\"
      end type input_path
      type (input_path) :: in_path

      end module input_file_module
";

    #[test]
    fn maps_variables_to_filenames() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("input_file_module.f90");
        fs::write(&path, MODULE).unwrap();

        let entries = parse_input_files(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].variable, "in_con%hru");
        assert_eq!(entries[0].filename, "hru.con");
        assert_eq!(entries[0].group, "input_con");
        assert_eq!(entries[1].variable, "in_con%ru");
    }

    #[test]
    fn configurable_set_is_lowercased_and_includes_path_types() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("input_file_module.f90");
        fs::write(&path, MODULE).unwrap();

        let files = configurable_files(&path).unwrap();
        assert!(files.contains("hru.con"));
        assert!(files.contains("rout_unit.con"));
    }

    #[test]
    fn missing_module_is_a_typed_error() {
        let err = parse_input_files(Path::new("/nonexistent/input_file_module.f90")).unwrap_err();
        assert!(matches!(err, FortranError::MissingModuleFile(_)));
    }
}
