use std::fs;
use swatlens_ford::FordParser;
use swatlens_params::csv::write_parameters_csv;
use swatlens_params::validator::validate_csv_structure;
use swatlens_params::ParameterExtractor;
use tempfile::tempdir;

const FORD_JSON: &str = r#"{
    "items": [
        {
            "type": "type",
            "name": "plant_db",
            "module": "plant_data_module",
            "src": "plant_data_module.f90",
            "variables": [
                {"name": "plantnm", "vartype": "character(len=40)", "initial": "''", "doc": "none |crop name"},
                {"name": "bio_e", "vartype": "real", "initial": "15.0", "doc": "(kg/ha)/(MJ/m**2)|biomass-energy ratio"},
                {"name": "hvsti", "vartype": "real", "initial": "0.76", "doc": "none |harvest index"}
            ]
        },
        {
            "type": "type",
            "name": "hydrology_parms",
            "module": "hydrology_data_module",
            "variables": [
                {"name": "esco", "vartype": "real", "initial": "0.95", "doc": "none |soil evaporation compensation factor"}
            ]
        },
        {
            "type": "type",
            "name": "not_a_table",
            "module": "misc_module",
            "variables": [
                {"name": "scratch", "vartype": "real"}
            ]
        }
    ]
}"#;

fn load_parser(root: &std::path::Path) -> FordParser {
    let search = root.join("search");
    fs::create_dir_all(&search).unwrap();
    fs::write(search.join("search_database.json"), FORD_JSON).unwrap();
    let mut parser = FordParser::new(root);
    parser.load().unwrap();
    parser
}

#[test]
fn extraction_yields_one_row_per_database_field() {
    let temp = tempdir().unwrap();
    let parser = load_parser(temp.path());

    let parameters = ParameterExtractor::new(&parser).extract();

    // 3 plant_db fields + 1 hydrology_parms field; not_a_table is skipped
    assert_eq!(parameters.len(), 4);
    assert_eq!(parameters[0].unique_id, 1);
    assert_eq!(parameters[3].unique_id, 4);

    let plant_rows: Vec<_> = parameters
        .iter()
        .filter(|p| p.database_table == "plant_db")
        .collect();
    assert_eq!(plant_rows.len(), 3);
    assert_eq!(plant_rows[0].broad_classification, "PLANT");
    assert_eq!(plant_rows[0].swat_file, "plants.plt");
    assert_eq!(plant_rows[1].data_type, "numeric");
    assert_eq!(plant_rows[1].units, "(kg/ha)/(MJ/m**2)");
}

#[test]
fn generated_csv_passes_structure_validation() {
    let temp = tempdir().unwrap();
    let parser = load_parser(temp.path());
    let parameters = ParameterExtractor::new(&parser).extract();

    let csv_path = temp.path().join("modular_database.csv");
    write_parameters_csv(&parameters, &csv_path).unwrap();

    let content = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.lines().count(), 5); // header + 4 rows

    let result = validate_csv_structure(&csv_path).unwrap();
    assert!(result.valid, "errors: {:?}", result.errors);
}
