use crate::error::{ParamsError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use swatlens_fortran::scanner::read_source;

/// One field of an input-file schema, traced back to the reading code
#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    pub file_name: String,
    pub line_in_file: u32,
    pub position_in_file: u32,
    pub swat_code_type: String,
    pub variable_name: String,
    pub description: String,
    pub units: String,
    pub data_type: String,
    pub decimal_places: String,
    pub code_file: String,
    pub code_line_start: u32,
    pub code_line_end: u32,
    pub code_snippet: String,
    pub confidence: String,
    pub notes: String,
}

impl FieldSchema {
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.file_name, self.line_in_file, self.position_in_file
        )
    }
}

/// Evidence for one decision taken while updating the baseline CSV
#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    pub action: String,
    pub schema_key: String,
    pub swat_file: String,
    pub line_in_file: String,
    pub position_in_file: String,
    pub swat_code_type: String,
    pub variable_name: String,
    pub field_changed: String,
    pub confidence: String,
    pub code_file: String,
    pub code_line_start: u32,
    pub code_line_end: u32,
    pub code_snippet: String,
    pub notes: String,
}

impl Evidence {
    fn from_schema(action: &str, schema: &FieldSchema) -> Self {
        Self {
            action: action.to_string(),
            schema_key: schema.key(),
            swat_file: schema.file_name.clone(),
            line_in_file: schema.line_in_file.to_string(),
            position_in_file: schema.position_in_file.to_string(),
            swat_code_type: schema.swat_code_type.clone(),
            variable_name: schema.variable_name.clone(),
            field_changed: String::new(),
            confidence: schema.confidence.clone(),
            code_file: schema.code_file.clone(),
            code_line_start: schema.code_line_start,
            code_line_end: schema.code_line_end,
            code_snippet: schema.code_snippet.clone(),
            notes: String::new(),
        }
    }
}

/// Per-file change summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSummary {
    pub swat_file: String,
    pub baseline_rows: usize,
    pub updated_rows: usize,
    pub extracted_rows: usize,
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Columns whose change counts as structural; description/units differences
/// are reported but never applied.
const STRUCTURAL_FIELDS: &[&str] = &[
    "Line_in_file",
    "Position_in_File",
    "SWAT_Code_Variable_Name",
    "Data_Type",
    "Number_Decimal_Places",
];

type BaselineRow = BTreeMap<String, String>;

fn row_key(row: &BaselineRow) -> String {
    format!(
        "{}|{}|{}",
        row.get("SWAT_File").map(String::as_str).unwrap_or(""),
        row.get("Line_in_file").map(String::as_str).unwrap_or(""),
        row.get("Position_in_File").map(String::as_str).unwrap_or(""),
    )
}

fn is_wildcard_row(row: &BaselineRow) -> bool {
    row.get("Line_in_file").map(String::as_str) == Some("*")
        || row.get("Position_in_File").map(String::as_str) == Some("*")
}

/// Updates a baseline modular-database CSV from extracted field schemas
pub struct CsvUpdater {
    header: Vec<String>,
    baseline: Vec<BaselineRow>,
}

pub struct UpdateOutcome {
    pub rows: Vec<BaselineRow>,
    pub evidence: Vec<Evidence>,
    pub summaries: BTreeMap<String, FileSummary>,
}

impl CsvUpdater {
    pub fn load(baseline_csv: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(baseline_csv)?;

        let mut rows = reader.records();
        let header: Vec<String> = match rows.next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => return Err(ParamsError::MissingHeader(baseline_csv.to_path_buf())),
        };

        let mut baseline = Vec::new();
        for record in rows {
            let record = record?;
            let row: BaselineRow = header
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();
            baseline.push(row);
        }

        log::info!(
            "Loaded baseline CSV with {} rows from {}",
            baseline.len(),
            baseline_csv.display()
        );
        Ok(Self { header, baseline })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Apply extracted schemas: update matched rows (structural fields
    /// only), add unmatched schemas, flag unmatched baseline rows as
    /// removed, and keep wildcard rows untouched.
    pub fn update(&self, schemas: &[FieldSchema]) -> UpdateOutcome {
        let mut evidence = Vec::new();
        let mut summaries: BTreeMap<String, FileSummary> = BTreeMap::new();

        let mut baseline_by_key: BTreeMap<String, usize> = BTreeMap::new();
        for (idx, row) in self.baseline.iter().enumerate() {
            baseline_by_key.insert(row_key(row), idx);
        }

        for schema in schemas {
            let summary = summaries
                .entry(schema.file_name.clone())
                .or_insert_with(|| FileSummary {
                    swat_file: schema.file_name.clone(),
                    ..FileSummary::default()
                });
            summary.extracted_rows += 1;
        }
        for row in &self.baseline {
            if let Some(file) = row.get("SWAT_File") {
                if let Some(summary) = summaries.get_mut(file) {
                    summary.baseline_rows += 1;
                }
            }
        }

        let mut out_rows: Vec<BaselineRow> = Vec::new();
        let mut matched_keys: Vec<String> = Vec::new();

        for schema in schemas {
            let summary = summaries.get_mut(&schema.file_name).expect("seeded above");

            let baseline_idx = self.find_matching_row(&baseline_by_key, schema);
            match baseline_idx {
                Some(idx) => {
                    let baseline_row = &self.baseline[idx];
                    matched_keys.push(row_key(baseline_row));

                    let mut row = baseline_row.clone();
                    let mut changes: Vec<&str> = Vec::new();

                    // wildcard line markers in the baseline are kept as-is
                    let baseline_line = row.get("Line_in_file").cloned().unwrap_or_default();
                    if baseline_line != "*" && baseline_line != schema.line_in_file.to_string() {
                        changes.push("Line_in_file");
                        row.insert("Line_in_file".to_string(), schema.line_in_file.to_string());
                    }
                    if row.get("Position_in_File").map(String::as_str)
                        != Some(schema.position_in_file.to_string().as_str())
                    {
                        changes.push("Position_in_File");
                        row.insert(
                            "Position_in_File".to_string(),
                            schema.position_in_file.to_string(),
                        );
                    }
                    if row.get("SWAT_Code_Variable_Name").map(String::as_str)
                        != Some(schema.variable_name.as_str())
                    {
                        changes.push("SWAT_Code_Variable_Name");
                        row.insert(
                            "SWAT_Code_Variable_Name".to_string(),
                            schema.variable_name.clone(),
                        );
                    }
                    if !schema.description.is_empty()
                        && row.get("Description").map(String::as_str)
                            != Some(schema.description.as_str())
                    {
                        changes.push("Description");
                    }
                    if !schema.units.is_empty()
                        && row.get("Units").map(String::as_str) != Some(schema.units.as_str())
                    {
                        changes.push("Units");
                    }
                    if row.get("Data_Type").map(String::as_str) != Some(schema.data_type.as_str()) {
                        changes.push("Data_Type");
                        row.insert("Data_Type".to_string(), schema.data_type.clone());
                    }
                    if !schema.decimal_places.is_empty()
                        && row.get("Number_Decimal_Places").map(String::as_str)
                            != Some(schema.decimal_places.as_str())
                    {
                        changes.push("Number_Decimal_Places");
                        row.insert(
                            "Number_Decimal_Places".to_string(),
                            schema.decimal_places.clone(),
                        );
                    }

                    if changes.is_empty() {
                        summary.unchanged += 1;
                        evidence.push(Evidence::from_schema("unchanged", schema));
                    } else if changes.iter().all(|c| !STRUCTURAL_FIELDS.contains(c)) {
                        // description/units only: report, do not apply
                        summary.unchanged += 1;
                        let mut ev = Evidence::from_schema("info", schema);
                        ev.field_changed = changes.join(",");
                        ev.notes = "description change only; not applied".to_string();
                        evidence.push(ev);
                    } else {
                        // structural change: apply description/units too
                        if changes.contains(&"Description") {
                            row.insert("Description".to_string(), schema.description.clone());
                        }
                        if changes.contains(&"Units") {
                            row.insert("Units".to_string(), schema.units.clone());
                        }
                        summary.updated += 1;
                        let mut ev = Evidence::from_schema("updated", schema);
                        ev.field_changed = changes.join(",");
                        evidence.push(ev);
                    }

                    out_rows.push(row);
                }
                None => {
                    // new row, seeded from any existing row of the same file
                    let mut row = self
                        .baseline
                        .iter()
                        .find(|r| r.get("SWAT_File").map(String::as_str) == Some(&schema.file_name))
                        .cloned()
                        .unwrap_or_else(|| {
                            self.header
                                .iter()
                                .map(|col| (col.clone(), String::new()))
                                .collect()
                        });

                    row.insert("SWAT_File".to_string(), schema.file_name.clone());
                    row.insert("Line_in_file".to_string(), schema.line_in_file.to_string());
                    row.insert(
                        "Position_in_File".to_string(),
                        schema.position_in_file.to_string(),
                    );
                    row.insert(
                        "SWAT_Code_Variable_Name".to_string(),
                        schema.variable_name.clone(),
                    );
                    row.insert("Description".to_string(), schema.description.clone());
                    row.insert("Units".to_string(), schema.units.clone());
                    row.insert("Data_Type".to_string(), schema.data_type.clone());
                    row.insert(
                        "Number_Decimal_Places".to_string(),
                        schema.decimal_places.clone(),
                    );

                    summary.added += 1;
                    let mut ev = Evidence::from_schema("added", schema);
                    ev.notes = "New schema element added from code".to_string();
                    evidence.push(ev);
                    out_rows.push(row);
                }
            }
        }

        // untouched baseline rows: keep foreign files and wildcard rows,
        // flag the rest as removed
        for row in &self.baseline {
            let key = row_key(row);
            let file = row.get("SWAT_File").cloned().unwrap_or_default();

            if !summaries.contains_key(&file) {
                out_rows.push(row.clone());
                continue;
            }
            if matched_keys.contains(&key) {
                continue;
            }

            if is_wildcard_row(row) {
                out_rows.push(row.clone());
                evidence.push(Evidence {
                    action: "unchanged".to_string(),
                    schema_key: key,
                    swat_file: file,
                    line_in_file: row.get("Line_in_file").cloned().unwrap_or_default(),
                    position_in_file: row.get("Position_in_File").cloned().unwrap_or_default(),
                    swat_code_type: row.get("Swat_code type").cloned().unwrap_or_default(),
                    variable_name: row
                        .get("SWAT_Code_Variable_Name")
                        .cloned()
                        .unwrap_or_default(),
                    field_changed: String::new(),
                    confidence: String::new(),
                    code_file: String::new(),
                    code_line_start: 0,
                    code_line_end: 0,
                    code_snippet: String::new(),
                    notes: "wildcard row; keep even if not mapped to read structure".to_string(),
                });
            } else {
                if let Some(summary) = summaries.get_mut(&file) {
                    summary.removed += 1;
                }
                evidence.push(Evidence {
                    action: "removed".to_string(),
                    schema_key: key,
                    swat_file: file,
                    line_in_file: row.get("Line_in_file").cloned().unwrap_or_default(),
                    position_in_file: row.get("Position_in_File").cloned().unwrap_or_default(),
                    swat_code_type: row.get("Swat_code type").cloned().unwrap_or_default(),
                    variable_name: row
                        .get("SWAT_Code_Variable_Name")
                        .cloned()
                        .unwrap_or_default(),
                    field_changed: String::new(),
                    confidence: String::new(),
                    code_file: String::new(),
                    code_line_start: 0,
                    code_line_end: 0,
                    code_snippet: String::new(),
                    notes: "Not found in current code".to_string(),
                });
            }
        }

        for summary in summaries.values_mut() {
            summary.updated_rows = summary.baseline_rows - summary.removed + summary.added;
        }

        UpdateOutcome {
            rows: out_rows,
            evidence,
            summaries,
        }
    }

    fn find_matching_row(
        &self,
        baseline_by_key: &BTreeMap<String, usize>,
        schema: &FieldSchema,
    ) -> Option<usize> {
        let exact = schema.key();
        if let Some(&idx) = baseline_by_key.get(&exact) {
            return Some(idx);
        }
        let wildcard = format!("{}|*|{}", schema.file_name, schema.position_in_file);
        baseline_by_key.get(&wildcard).copied()
    }

    pub fn write_rows(&self, output: &Path, rows: &[BaselineRow]) -> Result<()> {
        let mut writer = csv::Writer::from_path(output)?;
        writer.write_record(&self.header)?;
        for row in rows {
            let record: Vec<&str> = self
                .header
                .iter()
                .map(|col| row.get(col).map(String::as_str).unwrap_or(""))
                .collect();
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

pub fn write_evidence_csv(output: &Path, evidence: &[Evidence]) -> Result<()> {
    let mut writer = csv::Writer::from_path(output)?;
    for ev in evidence {
        writer.serialize(ev)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary_csv(output: &Path, summaries: &BTreeMap<String, FileSummary>) -> Result<()> {
    let mut writer = csv::Writer::from_path(output)?;
    for summary in summaries.values() {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

/// Extracted schema as NDJSON, one field per line
pub fn write_schema_ndjson(output: &Path, schemas: &[FieldSchema]) -> Result<()> {
    let mut file = BufWriter::new(File::create(output)?);
    for schema in schemas {
        serde_json::to_writer(&mut file, schema)?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Field declarations of a derived type in a Fortran module file, with the
/// `units |description` comment split out.
pub fn extract_type_definition(
    module_file: &Path,
    type_name: &str,
) -> BTreeMap<String, (String, String, String)> {
    let mut fields = BTreeMap::new();
    let Ok(content) = read_source(module_file) else {
        return fields;
    };

    let mut in_type = false;
    for raw in content.lines() {
        let (code, comment) = match raw.split_once('!') {
            Some((code, comment)) => (code.trim(), comment.trim()),
            None => (raw.trim(), ""),
        };

        if in_type {
            let lowered = code.to_lowercase();
            if lowered.starts_with("end type") || lowered.starts_with("endtype") {
                break;
            }
            let Some((decl_type, rest)) = code.split_once("::") else {
                continue;
            };
            let fortran_type = decl_type.trim().to_lowercase();
            let name = rest.split('=').next().unwrap_or("").trim().to_string();
            if name.is_empty() {
                continue;
            }

            let data_type = if fortran_type.contains("character") {
                "string"
            } else if fortran_type.contains("integer") {
                "integer"
            } else if fortran_type.contains("real") || fortran_type.contains("double") {
                "numeric"
            } else if fortran_type.contains("logical") {
                "boolean"
            } else {
                continue;
            };

            let (units, description) = match comment.split_once('|') {
                Some((units, desc)) => (units.trim().to_string(), desc.trim().to_string()),
                None => (String::new(), comment.to_string()),
            };
            fields.insert(name, (data_type.to_string(), units, description));
        } else {
            let lowered = code.to_lowercase();
            if lowered.starts_with("type") && lowered.contains(&type_name.to_lowercase()) {
                in_type = true;
            }
        }
    }

    fields
}

/// Built-in pilot schemas assembled from hand-verified read layouts, with
/// descriptions and units pulled from the module sources when available.
pub fn pilot_schemas(src_dir: &Path) -> Vec<FieldSchema> {
    let mut schemas = Vec::new();
    schemas.extend(time_sim_schema(src_dir));
    schemas.extend(hru_con_schema());
    schemas.extend(plant_ini_schema());
    schemas.extend(hyd_sed_lte_schema(src_dir));
    schemas
}

fn schema(
    file_name: &str,
    line: u32,
    pos: u32,
    code_type: &str,
    var: &str,
    description: &str,
    units: &str,
    data_type: &str,
    code_file: &str,
    code_lines: (u32, u32),
    snippet: &str,
) -> FieldSchema {
    FieldSchema {
        file_name: file_name.to_string(),
        line_in_file: line,
        position_in_file: pos,
        swat_code_type: code_type.to_string(),
        variable_name: var.to_string(),
        description: description.to_string(),
        units: units.to_string(),
        data_type: data_type.to_string(),
        decimal_places: String::new(),
        code_file: code_file.to_string(),
        code_line_start: code_lines.0,
        code_line_end: code_lines.1,
        code_snippet: snippet.to_string(),
        confidence: "high".to_string(),
        notes: String::new(),
    }
}

fn time_sim_schema(src_dir: &Path) -> Vec<FieldSchema> {
    const SNIPPET: &str = "read (107,*,iostat=eof) time%day_start, time%yrc_start, time%day_end, time%yrc_end, time%step";
    let fields = extract_type_definition(&src_dir.join("time_module.f90"), "time_current");

    ["day_start", "yrc_start", "day_end", "yrc_end", "step"]
        .iter()
        .enumerate()
        .map(|(i, var)| {
            let looked_up = fields.get(*var);
            schema(
                "time.sim",
                3,
                i as u32 + 1,
                "time",
                var,
                looked_up.map(|f| f.2.as_str()).unwrap_or(""),
                looked_up
                    .map(|f| f.1.as_str())
                    .filter(|u| !u.is_empty())
                    .unwrap_or("none"),
                looked_up.map(|f| f.0.as_str()).unwrap_or("integer"),
                "time_read.f90",
                (28, 28),
                SNIPPET,
            )
        })
        .collect()
}

fn hru_con_schema() -> Vec<FieldSchema> {
    const SNIPPET: &str = "read (107,*,iostat=eof) ob(i)%num, ob(i)%name, ob(i)%gis_id, ob(i)%area_ha, ob(i)%lat, ob(i)%long, ...";
    const VARS: &[(&str, &str, &str)] = &[
        ("num", "integer", "HRU number"),
        ("name", "string", "HRU name"),
        ("gis_id", "string", "HRU GIS id"),
        ("area_ha", "numeric", "HRU area"),
        ("lat", "numeric", "Latitude"),
        ("long", "numeric", "Longitude"),
        ("elev", "numeric", "Elevation"),
        ("props", "string", "HRU properties pointer"),
        ("wst_c", "string", "Weather station pointer"),
        ("constit", "string", "Constituent pointer"),
        ("props2", "string", "Properties 2 pointer"),
        ("ruleset", "string", "Ruleset pointer"),
        ("src_tot", "integer", "Total number of sources"),
    ];

    VARS.iter()
        .enumerate()
        .map(|(i, (var, dtype, desc))| {
            schema(
                "hru.con",
                3,
                i as u32 + 1,
                "ob",
                var,
                desc,
                "",
                dtype,
                "hyd_read_connect.f90",
                (220, 221),
                SNIPPET,
            )
        })
        .collect()
}

fn plant_ini_schema() -> Vec<FieldSchema> {
    const HEADER_SNIPPET: &str =
        "read (113,*,iostat=eof)  pcomdb(icom)%name, pcomdb(icom)%plants_com, pcomdb(icom)%rot_yr_ini";
    const PLANT_SNIPPET: &str =
        "read (113,*,iostat=eof) pcomdb(icom)%pl(iplt)%cpnm, pcomdb(icom)%pl(iplt)%igro, ...";

    const HEADER_VARS: &[(&str, &str, &str)] = &[
        ("name", "string", "Plant community name"),
        ("plants_com", "integer", "Number of plants in community"),
        ("rot_yr_ini", "integer", "Initial rotation year"),
    ];
    const PLANT_VARS: &[(&str, &str, &str)] = &[
        ("cpnm", "string", "Plant name"),
        ("igro", "integer", "Land cover status code"),
        ("lai", "numeric", "Initial leaf area index"),
        ("bioms", "numeric", "Initial biomass"),
        ("phuacc", "numeric", "Initial accumulated heat units"),
        ("pop", "numeric", "Initial plant population"),
        ("fr_yrmat", "numeric", "Fraction of years to maturity"),
        ("rsdin", "numeric", "Initial residue"),
    ];

    let mut schemas: Vec<FieldSchema> = HEADER_VARS
        .iter()
        .enumerate()
        .map(|(i, (var, dtype, desc))| {
            schema(
                "plant.ini",
                3,
                i as u32 + 1,
                "pcomdb",
                var,
                desc,
                "",
                dtype,
                "readpcom.f90",
                (62, 62),
                HEADER_SNIPPET,
            )
        })
        .collect();

    schemas.extend(PLANT_VARS.iter().enumerate().map(|(i, (var, dtype, desc))| {
        schema(
            "plant.ini",
            4,
            i as u32 + 1,
            "pcomdb%pl",
            var,
            desc,
            "",
            dtype,
            "readpcom.f90",
            (68, 70),
            PLANT_SNIPPET,
        )
    }));

    schemas
}

fn hyd_sed_lte_schema(src_dir: &Path) -> Vec<FieldSchema> {
    const SNIPPET: &str = "read (1,*,iostat=eof) sd_chd(idb)";
    const VAR_ORDER: &[&str] = &[
        "name", "order", "chw", "chd", "chs", "chl", "chn", "chk", "bank_exp", "cov", "sinu",
        "vcr_coef", "d50", "ch_clay", "carbon", "ch_bd", "chss", "bankfull_flo", "fps", "fpn",
        "n_conc", "p_conc", "p_bio",
    ];

    let fields = extract_type_definition(
        &src_dir.join("sd_channel_module.f90"),
        "swatdeg_hydsed_data",
    );

    VAR_ORDER
        .iter()
        .enumerate()
        .map(|(i, var)| {
            let looked_up = fields.get(*var);
            schema(
                "hyd-sed-lte.cha",
                3,
                i as u32 + 1,
                "sd_chd",
                var,
                looked_up.map(|f| f.2.as_str()).unwrap_or(""),
                looked_up.map(|f| f.1.as_str()).unwrap_or(""),
                looked_up.map(|f| f.0.as_str()).unwrap_or("numeric"),
                "sd_hydsed_read.f90",
                (61, 61),
                SNIPPET,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const BASELINE: &str = "\
SWAT_File,Line_in_file,Position_in_File,Swat_code type,SWAT_Code_Variable_Name,Description,Units,Data_Type,Number_Decimal_Places
time.sim,3,1,time,day_start,Starting day,none,integer,
time.sim,*,2,time,yrc_start,Starting year,none,integer,
time.sim,3,9,time,stale_field,Old field,none,integer,
plants.plt,3,1,pldb,plantnm,Plant name,none,string,
";

    fn one_schema(pos: u32, var: &str, dtype: &str, desc: &str) -> FieldSchema {
        schema(
            "time.sim",
            3,
            pos,
            "time",
            var,
            desc,
            "none",
            dtype,
            "time_read.f90",
            (28, 28),
            "read (107,*,iostat=eof) ...",
        )
    }

    fn load_updater(temp: &tempfile::TempDir) -> CsvUpdater {
        let path = temp.path().join("baseline.csv");
        fs::write(&path, BASELINE).unwrap();
        CsvUpdater::load(&path).unwrap()
    }

    #[test]
    fn description_only_change_is_info_and_not_applied() {
        let temp = tempdir().unwrap();
        let updater = load_updater(&temp);

        let schemas = vec![one_schema(1, "day_start", "integer", "A different wording")];
        let outcome = updater.update(&schemas);

        let info: Vec<_> = outcome.evidence.iter().filter(|e| e.action == "info").collect();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].field_changed, "Description");

        let row = outcome
            .rows
            .iter()
            .find(|r| r.get("SWAT_Code_Variable_Name").map(String::as_str) == Some("day_start"))
            .unwrap();
        assert_eq!(row.get("Description").map(String::as_str), Some("Starting day"));
    }

    #[test]
    fn wildcard_rows_match_and_are_never_removed() {
        let temp = tempdir().unwrap();
        let updater = load_updater(&temp);

        let schemas = vec![one_schema(2, "yrc_start", "integer", "Starting year")];
        let outcome = updater.update(&schemas);

        // the wildcard row matched; its line marker survives
        let row = outcome
            .rows
            .iter()
            .find(|r| r.get("SWAT_Code_Variable_Name").map(String::as_str) == Some("yrc_start"))
            .unwrap();
        assert_eq!(row.get("Line_in_file").map(String::as_str), Some("*"));
    }

    #[test]
    fn unmatched_baseline_row_is_flagged_removed() {
        let temp = tempdir().unwrap();
        let updater = load_updater(&temp);

        let schemas = vec![one_schema(1, "day_start", "integer", "Starting day")];
        let outcome = updater.update(&schemas);

        let removed: Vec<_> = outcome
            .evidence
            .iter()
            .filter(|e| e.action == "removed")
            .collect();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].variable_name, "stale_field");
        assert_eq!(outcome.summaries["time.sim"].removed, 1);
    }

    #[test]
    fn rows_for_other_files_pass_through() {
        let temp = tempdir().unwrap();
        let updater = load_updater(&temp);

        let outcome = updater.update(&[one_schema(1, "day_start", "integer", "Starting day")]);
        assert!(outcome
            .rows
            .iter()
            .any(|r| r.get("SWAT_File").map(String::as_str) == Some("plants.plt")));
    }

    #[test]
    fn new_schema_element_is_added() {
        let temp = tempdir().unwrap();
        let updater = load_updater(&temp);

        let schemas = vec![
            one_schema(1, "day_start", "integer", "Starting day"),
            one_schema(5, "step", "integer", "Time step"),
        ];
        let outcome = updater.update(&schemas);

        assert_eq!(outcome.summaries["time.sim"].added, 1);
        assert!(outcome
            .evidence
            .iter()
            .any(|e| e.action == "added" && e.variable_name == "step"));
    }

    #[test]
    fn pilot_schemas_cover_the_four_files() {
        let temp = tempdir().unwrap();
        let schemas = pilot_schemas(temp.path());

        let files: std::collections::BTreeSet<&str> =
            schemas.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(
            files,
            ["hru.con", "hyd-sed-lte.cha", "plant.ini", "time.sim"]
                .into_iter()
                .collect()
        );
        assert_eq!(schemas.iter().filter(|s| s.file_name == "hru.con").count(), 13);
    }

    #[test]
    fn type_definition_extraction_splits_units_and_description() {
        let temp = tempdir().unwrap();
        let module = temp.path().join("time_module.f90");
        fs::write(
            &module,
            "      module time_module\n\
                   type time_current\n\
                     integer :: day_start = 0   !julian day  |first day of simulation\n\
                     integer :: step = 0        !none        |number of time steps per day\n\
                   end type time_current\n\
                   end module time_module\n",
        )
        .unwrap();

        let fields = extract_type_definition(&module, "time_current");
        assert_eq!(
            fields["day_start"],
            (
                "integer".to_string(),
                "julian day".to_string(),
                "first day of simulation".to_string()
            )
        );
    }
}
