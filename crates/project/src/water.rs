use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Accumulated findings for one validated file
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl FileValidation {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Supporting `.wal` files expected next to a water allocation file
pub const SUPPORTING_FILES: &[&str] = &[
    "water_treat.wal",
    "water_use.wal",
    "water_pipe.wal",
    "water_tower.wal",
    "om_treat.wal",
    "om_use.wal",
];

/// State of one supporting file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportState {
    Ok,
    TooShort,
    Missing,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportCheck {
    pub filename: String,
    pub state: SupportState,
}

/// Validate a `.wro` water allocation file: title, object count, then per
/// object a header line, a definition line, a source section (>= 15 tokens
/// per source) and a demand section (>= 8 tokens per demand).
pub fn validate_wro_file(path: &Path) -> FileValidation {
    let mut result = FileValidation::default();

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            result.errors.push(format!("File not found: {} ({e})", path.display()));
            return result;
        }
    };
    let lines: Vec<&str> = content.lines().map(str::trim).collect();

    if lines.len() < 5 {
        result
            .errors
            .push("File too short - missing required sections".to_string());
        return result;
    }

    if lines[0].is_empty() {
        result
            .warnings
            .push("Line 1: No title/comment provided".to_string());
    }

    let num_objects = match lines[1].parse::<i64>() {
        Ok(n) if n < 1 => {
            result
                .errors
                .push("Line 2: Number of objects must be >= 1".to_string());
            n
        }
        Ok(n) => n,
        Err(_) => {
            result.errors.push("Line 2: Invalid number format".to_string());
            return result;
        }
    };

    let mut current = 2usize;
    for obj_idx in 1..=num_objects.max(0) {
        // header line
        if current >= lines.len() {
            result
                .errors
                .push(format!("Object {obj_idx}: Missing header line"));
            break;
        }
        current += 1;

        // object definition: name, rule type, source count, demand count
        if current >= lines.len() {
            result
                .errors
                .push(format!("Object {obj_idx}: Missing object definition"));
            break;
        }
        let obj_parts: Vec<&str> = lines[current].split_whitespace().collect();
        let mut src_count = 0usize;
        let mut dmd_count = 0usize;
        if obj_parts.len() < 4 {
            result
                .errors
                .push(format!("Object {obj_idx}: Invalid object definition format"));
        } else {
            match (obj_parts[2].parse::<usize>(), obj_parts[3].parse::<usize>()) {
                (Ok(src), Ok(dmd)) => {
                    src_count = src;
                    dmd_count = dmd;
                }
                _ => result
                    .errors
                    .push(format!("Object {obj_idx}: Invalid source/demand counts")),
            }
        }
        current += 1;

        // source objects: src_num, ob_typ, ob_num, 12 monthly limits
        if current < lines.len() && lines[current].to_lowercase().contains("source") {
            current += 1;
            for src_idx in 1..=src_count {
                if current >= lines.len() {
                    result
                        .errors
                        .push(format!("Object {obj_idx}: Missing source {src_idx}"));
                    break;
                }
                if lines[current].split_whitespace().count() < 15 {
                    result.errors.push(format!(
                        "Object {obj_idx}, Source {src_idx}: Invalid format"
                    ));
                }
                current += 1;
            }
        }

        // demand objects
        if current < lines.len() && lines[current].to_lowercase().contains("demand") {
            current += 1;
            for dmd_idx in 1..=dmd_count {
                if current >= lines.len() {
                    result
                        .errors
                        .push(format!("Object {obj_idx}: Missing demand {dmd_idx}"));
                    break;
                }
                if lines[current].split_whitespace().count() < 8 {
                    result.errors.push(format!(
                        "Object {obj_idx}, Demand {dmd_idx}: Invalid format"
                    ));
                }
                current += 1;
            }
        }
    }

    log::info!(
        "Validation complete for {}: {} errors, {} warnings",
        path.display(),
        result.errors.len(),
        result.warnings.len()
    );
    result
}

/// Presence and minimum-length checks over the supporting `.wal` files
pub fn check_supporting_files(directory: &Path) -> Vec<SupportCheck> {
    SUPPORTING_FILES
        .iter()
        .map(|filename| {
            let path = directory.join(filename);
            let state = match fs::read_to_string(&path) {
                Ok(content) if content.lines().count() < 3 => SupportState::TooShort,
                Ok(_) => SupportState::Ok,
                Err(_) => SupportState::Missing,
            };
            SupportCheck {
                filename: filename.to_string(),
                state,
            }
        })
        .collect()
}

/// All `.wro` files directly inside a directory, sorted by name
pub fn find_wro_files(directory: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = fs::read_dir(directory) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("wro") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const VALID_WRO: &str = "\
water_allocation.wro: municipal demo
1
name rule_typ src_obs dmd_obs
city_water wr_meas 1 1
source objects
1 res 1 10. 10. 10. 10. 10. 10. 10. 10. 10. 10. 10. 10.
demand objects
1 muni 1 ave_day 0.5 res 1 unlim
";

    #[test]
    fn valid_file_passes() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("water_allocation.wro");
        fs::write(&path, VALID_WRO).unwrap();

        let result = validate_wro_file(&path);
        assert!(result.passed(), "errors: {:?}", result.errors);
    }

    #[test]
    fn short_file_stops_after_first_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("short.wro");
        fs::write(&path, "title\n1\nheader\n").unwrap();

        let result = validate_wro_file(&path);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("File too short"));
    }

    #[test]
    fn bad_object_count_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.wro");
        fs::write(&path, "title\nabc\nheader\nx y z w\nmore\n").unwrap();

        let result = validate_wro_file(&path);
        assert_eq!(result.errors, vec!["Line 2: Invalid number format"]);
    }

    #[test]
    fn short_source_row_is_flagged() {
        let content = VALID_WRO.replace(
            "1 res 1 10. 10. 10. 10. 10. 10. 10. 10. 10. 10. 10. 10.",
            "1 res 1 10.",
        );
        let temp = tempdir().unwrap();
        let path = temp.path().join("src.wro");
        fs::write(&path, content).unwrap();

        let result = validate_wro_file(&path);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("Source 1: Invalid format")));
    }

    #[test]
    fn supporting_files_report_missing_and_short() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("water_treat.wal"), "title\nheader\ndata\n").unwrap();
        fs::write(temp.path().join("water_use.wal"), "x\n").unwrap();

        let checks = check_supporting_files(temp.path());
        assert_eq!(checks.len(), SUPPORTING_FILES.len());
        assert_eq!(checks[0].state, SupportState::Ok);
        assert_eq!(checks[1].state, SupportState::TooShort);
        assert_eq!(checks[2].state, SupportState::Missing);
    }
}
