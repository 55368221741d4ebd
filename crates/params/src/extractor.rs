use crate::mapping::ParameterMapping;
use serde::Serialize;
use std::collections::BTreeMap;
use swatlens_ford::{FordParser, FortranField, FortranType};

/// Extracts parameter mappings from FORD-parsed database types using
/// hand-written lookup tables.
pub struct ParameterExtractor<'a> {
    ford: &'a FordParser,
}

impl<'a> ParameterExtractor<'a> {
    pub fn new(ford: &'a FordParser) -> Self {
        Self { ford }
    }

    /// One mapping per field of every database type, in type order
    pub fn extract(&self) -> Vec<ParameterMapping> {
        log::info!("Starting parameter extraction...");

        let mut parameters = Vec::new();
        let mut parameter_id = 1;

        for (type_name, type_obj) in self.ford.database_types() {
            log::info!(
                "Processing type: {} ({} fields)",
                type_name,
                type_obj.fields.len()
            );
            for field in &type_obj.fields {
                parameters.push(build_mapping(parameter_id, type_name, type_obj, field));
                parameter_id += 1;
            }
        }

        log::info!("Extracted {} parameters", parameters.len());
        parameters
    }
}

fn build_mapping(
    param_id: u32,
    type_name: &str,
    type_obj: &FortranType,
    field: &FortranField,
) -> ParameterMapping {
    ParameterMapping {
        unique_id: param_id,
        broad_classification: classify(type_name).to_string(),
        swat_file: map_to_swat_file(type_name),
        database_table: type_name.to_string(),
        database_field_name: field.name.clone(),
        swat_header_name: field.name.clone(),
        text_file_structure: "Unique".to_string(),
        position_in_file: 1,
        line_in_file: 1,
        swat_code_type: type_obj.module.clone(),
        swat_code_variable_name: field.name.clone(),
        description: field
            .description
            .clone()
            .unwrap_or_else(|| format!("Parameter {} from {}", field.name, type_name)),
        core: "core".to_string(),
        units: field.units.clone().unwrap_or_else(|| "*".to_string()),
        data_type: map_fortran_to_csv_type(&field.data_type).to_string(),
        minimum_range: None,
        maximum_range: None,
        default_value: field.default_value.clone(),
        number_decimal_places: None,
        primary_key: false,
        foreign_key: None,
        foreign_table: None,
        foreign_variable: None,
        doc_path: None,
        use_in_db: "x".to_string(),
    }
}

/// Keyword classification of a type into the broad model components
pub fn classify(type_name: &str) -> &'static str {
    let name = type_name.to_lowercase();
    if name.contains("plant") {
        "PLANT"
    } else if name.contains("soil") {
        "SOIL"
    } else if name.contains("water") || name.contains("hydro") {
        "HYDROLOGY"
    } else if name.contains("weather") || name.contains("climate") {
        "CLIMATE"
    } else if name.contains("nutrient") || name.contains("nitrogen") || name.contains("phosphorus") {
        "NUTRIENTS"
    } else if name.contains("sediment") || name.contains("erosion") {
        "SEDIMENT"
    } else if name.contains("pesticide") {
        "PESTICIDE"
    } else if name.contains("pathogen") {
        "PATHOGEN"
    } else if name.contains("urban") {
        "URBAN"
    } else if name.contains("channel") {
        "CHANNEL"
    } else if name.contains("reservoir") || name.contains("wetland") {
        "WATER_BODY"
    } else if name.contains("aquifer") || name.contains("groundwater") {
        "GROUNDWATER"
    } else if name.contains("simulation") || name.contains("time") {
        "SIMULATION"
    } else if name.contains("output") || name.contains("print") {
        "OUTPUT"
    } else {
        "GENERAL"
    }
}

/// Map a type name to its SWAT+ input file, via the direct table first and
/// the `*_db` naming pattern second.
pub fn map_to_swat_file(type_name: &str) -> String {
    match type_name {
        "plant_db" => "plants.plt",
        "fertilizer_db" => "fertilizer.frt",
        "tillage_db" => "tillage.til",
        "pesticide_db" => "pesticide.pes",
        "pathogen_db" => "pathogens.pth",
        "metals_db" => "metals.mtl",
        "salt_db" => "salt.slt",
        "urban_db" => "urban.urb",
        "septic_db" => "septic.sep",
        "snow_db" => "snow.sno",
        "file_cio" => "file.cio",
        "time_sim" => "time.sim",
        "print_prt" => "print.prt",
        "object_prt" => "object.prt",
        "object_cnt" => "object.cnt",
        "hru_data" => "hru-data.hru",
        "hru_lte_data" => "hru-lte.hru",
        "channel_data" => "channel.cha",
        "reservoir_data" => "reservoir.res",
        "aquifer_data" => "aquifer.aqu",
        other => {
            return if let Some(base) = other.strip_suffix("_db") {
                format!("{base}.{}", file_extension(base))
            } else {
                format!("{other}.dat")
            };
        }
    }
    .to_string()
}

fn file_extension(base_name: &str) -> &'static str {
    let base = base_name.to_lowercase();
    const EXTENSIONS: &[(&str, &str)] = &[
        ("plant", "plt"),
        ("fertilizer", "frt"),
        ("tillage", "til"),
        ("pesticide", "pes"),
        ("pathogen", "pth"),
        ("metals", "mtl"),
        ("salt", "slt"),
        ("urban", "urb"),
        ("septic", "sep"),
        ("snow", "sno"),
        ("hru", "hru"),
        ("channel", "cha"),
        ("reservoir", "res"),
        ("aquifer", "aqu"),
        ("weather", "cli"),
    ];
    for (key, ext) in EXTENSIONS {
        if base.contains(key) {
            return ext;
        }
    }
    "dat"
}

/// Fortran declaration type to CSV data type
pub fn map_fortran_to_csv_type(fortran_type: &str) -> &'static str {
    let clean = fortran_type.to_lowercase();
    if clean.contains("character") {
        "string"
    } else if clean.contains("double precision") || clean.contains("real") {
        "numeric"
    } else if clean.contains("integer") {
        "integer"
    } else if clean.contains("logical") {
        "string"
    } else {
        "string"
    }
}

/// Counts over extracted parameters, keyed for the summary report
#[derive(Debug, Default, Serialize)]
pub struct ExtractionStats {
    pub total_parameters: usize,
    pub by_classification: BTreeMap<String, usize>,
    pub by_data_type: BTreeMap<String, usize>,
    pub by_file: BTreeMap<String, usize>,
    pub with_defaults: usize,
    pub with_units: usize,
    pub with_descriptions: usize,
}

pub fn extraction_stats(parameters: &[ParameterMapping]) -> ExtractionStats {
    let mut stats = ExtractionStats {
        total_parameters: parameters.len(),
        ..Default::default()
    };

    for param in parameters {
        *stats
            .by_classification
            .entry(param.broad_classification.clone())
            .or_default() += 1;
        *stats.by_data_type.entry(param.data_type.clone()).or_default() += 1;
        *stats.by_file.entry(param.swat_file.clone()).or_default() += 1;

        if param.default_value.is_some() {
            stats.with_defaults += 1;
        }
        if param.units != "*" && !param.units.is_empty() {
            stats.with_units += 1;
        }
        if !param.description.is_empty() {
            stats.with_descriptions += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classification_covers_known_components() {
        assert_eq!(classify("plant_db"), "PLANT");
        assert_eq!(classify("soil_parms"), "SOIL");
        assert_eq!(classify("aquifer_init"), "GROUNDWATER");
        assert_eq!(classify("snodb"), "GENERAL");
    }

    #[test]
    fn file_mapping_prefers_direct_table_then_pattern() {
        assert_eq!(map_to_swat_file("plant_db"), "plants.plt");
        assert_eq!(map_to_swat_file("sweep_db"), "sweep.dat");
        assert_eq!(map_to_swat_file("urbanwash_db"), "urbanwash.urb");
        assert_eq!(map_to_swat_file("time_current"), "time_current.dat");
    }

    #[test]
    fn fortran_types_map_to_csv_types() {
        assert_eq!(map_fortran_to_csv_type("real"), "numeric");
        assert_eq!(map_fortran_to_csv_type("double precision"), "numeric");
        assert_eq!(map_fortran_to_csv_type("integer"), "integer");
        assert_eq!(map_fortran_to_csv_type("character(len=40)"), "string");
        assert_eq!(map_fortran_to_csv_type("logical"), "string");
        assert_eq!(map_fortran_to_csv_type("type(mystery)"), "string");
    }
}
