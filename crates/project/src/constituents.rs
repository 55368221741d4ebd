use serde::Serialize;
use std::fs;
use std::path::Path;

/// Outcome of one constituent test-file check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// The constituent test file set with descriptions
pub const TEST_FILES: &[(&str, &str)] = &[
    ("fertilizer.frt_cs", "Fertilizer constituent concentrations"),
    ("pest.man", "Pesticide fertilizer table"),
    ("path.man", "Pathogen fertilizer table"),
    ("cs.man", "Generic constituent fertilizer table"),
    ("cs_hru.ini", "HRU constituent initialization"),
    ("cs_aqu.ini", "Aquifer constituent initialization"),
    ("cs_channel.ini", "Channel constituent initialization"),
];

/// Existence + non-empty check for one test file
pub fn check_exists(directory: &Path, filename: &str, description: &str) -> CheckResult {
    let path = directory.join(filename);
    let name = format!("{description} ({filename})");
    match fs::metadata(&path) {
        Ok(meta) if meta.len() == 0 => CheckResult::fail(name, "file is empty"),
        Ok(_) => CheckResult::pass(name, "exists"),
        Err(_) => CheckResult::fail(name, "missing"),
    }
}

/// `fertilizer.frt_cs`: header must carry the constituent columns and every
/// data row needs three parseable concentrations.
pub fn validate_fertilizer_frt_cs(path: &Path) -> CheckResult {
    let name = "fertilizer.frt_cs format";
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return CheckResult::fail(name, format!("error reading file: {e}")),
    };
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 3 {
        return CheckResult::fail(name, "file too short");
    }

    let header = lines[1];
    for col in ["name", "seo4", "seo3", "boron"] {
        if !header.contains(col) {
            return CheckResult::fail(name, format!("missing column: {col}"));
        }
    }

    let mut data_lines = 0usize;
    for (i, line) in lines.iter().enumerate().skip(2) {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        if parts[1..4].iter().any(|p| p.parse::<f64>().is_err()) {
            return CheckResult::fail(name, format!("invalid numeric data on line {}", i + 1));
        }
        data_lines += 1;
    }

    CheckResult::pass(name, format!("{data_lines} valid fertilizer entries"))
}

/// `pest.man` / `path.man` / `cs.man`: the expected constituent names must
/// appear somewhere in the table.
pub fn validate_constituent_table(path: &Path, expected: &[&str]) -> CheckResult {
    let name = format!(
        "{} constituents",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("table")
    );
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return CheckResult::fail(name, format!("error reading file: {e}")),
    };

    let found: Vec<&str> = expected
        .iter()
        .filter(|constituent| content.contains(**constituent))
        .copied()
        .collect();

    if found.is_empty() {
        CheckResult::fail(name, format!("no expected constituents found: {expected:?}"))
    } else {
        CheckResult::pass(name, format!("found constituents: {}", found.join(", ")))
    }
}

/// `cs_*.ini`: past the header block there must be at least one line of
/// all-numeric values.
pub fn validate_cs_ini(path: &Path) -> CheckResult {
    let name = format!(
        "{} data",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("ini")
    );
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return CheckResult::fail(name, format!("error reading file: {e}")),
    };
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 5 {
        return CheckResult::fail(name, "file too short");
    }

    let numeric_lines = lines
        .iter()
        .skip(5)
        .filter(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            parts.len() >= 3 && parts.iter().all(|p| p.parse::<f64>().is_ok())
        })
        .count();

    if numeric_lines > 0 {
        CheckResult::pass(name, format!("{numeric_lines} data lines"))
    } else {
        CheckResult::fail(name, "no valid numeric data found")
    }
}

/// Run the full constituent validation over a data directory. The directory
/// must hold a `fertilizer.frt` (the anchor for the test set).
pub fn run_all(directory: &Path) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if !directory.join("fertilizer.frt").exists() {
        results.push(CheckResult::fail(
            "fertilizer.frt",
            "not a constituent test directory (fertilizer.frt missing)",
        ));
        return results;
    }

    for (filename, description) in TEST_FILES {
        results.push(check_exists(directory, filename, description));
    }

    let frt_cs = directory.join("fertilizer.frt_cs");
    if frt_cs.exists() {
        results.push(validate_fertilizer_frt_cs(&frt_cs));
    }

    let pest = directory.join("pest.man");
    if pest.exists() {
        results.push(validate_constituent_table(&pest, &["roundup", "aatrex", "dual"]));
    }
    let path_man = directory.join("path.man");
    if path_man.exists() {
        results.push(validate_constituent_table(&path_man, &["ecoli", "salmonella"]));
    }
    let cs_man = directory.join("cs.man");
    if cs_man.exists() {
        results.push(validate_constituent_table(&cs_man, &["seo4", "seo3", "boron"]));
    }

    let cs_hru = directory.join("cs_hru.ini");
    if cs_hru.exists() {
        results.push(validate_cs_ini(&cs_hru));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn frt_cs_validation_checks_header_and_numerics() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("fertilizer.frt_cs");
        fs::write(
            &path,
            "fertilizer.frt_cs: constituent concentrations\n\
             name       seo4    seo3    boron\n\
             elem_n     0.00    0.00    0.00\n\
             11-52-00   1.50    0.25    3.10\n",
        )
        .unwrap();

        let result = validate_fertilizer_frt_cs(&path);
        assert!(result.passed);
        assert_eq!(result.detail, "2 valid fertilizer entries");
    }

    #[test]
    fn frt_cs_rejects_non_numeric_concentration() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("fertilizer.frt_cs");
        fs::write(
            &path,
            "title\nname seo4 seo3 boron\nelem_n bad 0.0 0.0\n",
        )
        .unwrap();

        let result = validate_fertilizer_frt_cs(&path);
        assert!(!result.passed);
        assert!(result.detail.contains("invalid numeric data on line 3"));
    }

    #[test]
    fn constituent_table_requires_expected_names() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cs.man");
        fs::write(&path, "cs.man\nseo4 10.0\nboron 2.0\n").unwrap();

        let result = validate_constituent_table(&path, &["seo4", "seo3", "boron"]);
        assert!(result.passed);
        assert!(result.detail.contains("seo4, boron"));

        let empty = temp.path().join("pest.man");
        fs::write(&empty, "pest.man\nnothing here\n").unwrap();
        let result = validate_constituent_table(&empty, &["roundup"]);
        assert!(!result.passed);
    }

    #[test]
    fn cs_ini_needs_numeric_data_past_header() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cs_hru.ini");
        fs::write(
            &path,
            "cs_hru.ini\nheader\nmore\nheader\nname\nplot1\n1.0 2.0 3.0\n",
        )
        .unwrap();

        let result = validate_cs_ini(&path);
        assert!(result.passed);
        assert_eq!(result.detail, "1 data lines");
    }

    #[test]
    fn run_all_requires_anchor_file() {
        let temp = tempdir().unwrap();
        let results = run_all(temp.path());
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
    }
}
