use crate::error::{FortranError, Result};
use crate::scanner::{is_comment_line, read_source, SourceScanner};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Kind of Fortran statement a filename was seen in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IoOp {
    Open,
    Read,
    Write,
    Inquire,
    Close,
    Reference,
}

impl IoOp {
    pub fn as_str(self) -> &'static str {
        match self {
            IoOp::Open => "open",
            IoOp::Read => "read",
            IoOp::Write => "write",
            IoOp::Inquire => "inquire",
            IoOp::Close => "close",
            IoOp::Reference => "reference",
        }
    }
}

/// One occurrence of a filename in the source tree
#[derive(Debug, Clone, Serialize)]
pub struct RefLocation {
    /// Source path relative to the scanned root
    pub source: String,
    pub line: usize,
    /// Enclosing subroutine/function, or "unknown"
    pub procedure: String,
    pub op: IoOp,
}

/// One hardcoded `open(unit, file="...")` occurrence
#[derive(Debug, Clone, Serialize)]
pub struct HardcodedRef {
    pub source: String,
    pub line: usize,
    pub statement: String,
}

/// One I/O statement with a string-literal `file=` argument
#[derive(Debug, Clone, Serialize)]
pub struct FioOccurrence {
    pub source: String,
    pub line: usize,
    pub statement: String,
    pub op: IoOp,
    pub literal: String,
}

/// Aggregated result of an I/O reference scan
#[derive(Debug, Default)]
pub struct IoRefIndex {
    /// filename literal -> every place it occurs
    pub files: BTreeMap<String, Vec<RefLocation>>,
    /// variable name in `file=var` -> every place it occurs
    pub variables: BTreeMap<String, Vec<RefLocation>>,
}

impl IoRefIndex {
    /// Group literal filenames by their normalized pattern
    pub fn grouped(&self) -> BTreeMap<String, Vec<(&str, &[RefLocation])>> {
        let mut grouped: BTreeMap<String, Vec<(&str, &[RefLocation])>> = BTreeMap::new();
        for (filename, locations) in &self.files {
            let pattern = crate::normalize::normalize_filename(filename);
            grouped
                .entry(pattern)
                .or_default()
                .push((filename.as_str(), locations.as_slice()));
        }
        grouped
    }
}

static OPEN_STMT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bopen\s*\(").expect("valid regex"));
static FILE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)file\s*=\s*["']([^"']+)["']"#).expect("valid regex"));
static FILE_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)file\s*=\s*(\w+)").expect("valid regex"));
static PROCEDURE_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(subroutine|function|program)\s+(\w+)").expect("valid regex"));
static HARDCODED_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)open\s*\(\s*\d+\s*,\s*file\s*=\s*["']([^"']+)["']"#).expect("valid regex")
});

/// Quoted token carrying a known SWAT+ extension, anywhere on the line
static EXTENSION_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)["']([^"']+\.(?:hru|sol|cha|res|aqu|con|ini|ops|str|frt|plt|cli|cio|out|key|def|ele|lum|dtl|sch|cst|pth|pes|prt|hrd|fld|sft|rec|dat|del|exc|wet|sno|hyd|wro|urb|wal|til|sim|sep|txt|csv))["']"#,
    )
    .expect("valid regex")
});

/// Target of an `open` statement's `file=` specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    Literal(String),
    Variable(String),
}

/// Extract the `file=` target from an `open` statement line, if present
pub fn open_target(line: &str) -> Option<OpenTarget> {
    if let Some(caps) = FILE_LITERAL.captures(line) {
        return Some(OpenTarget::Literal(caps[1].to_string()));
    }
    if let Some(caps) = FILE_VARIABLE.captures(line) {
        return Some(OpenTarget::Variable(caps[1].to_string()));
    }
    None
}

/// Find the subroutine/function name enclosing a 0-based line index by
/// scanning backward for the nearest declaration
pub fn enclosing_procedure(lines: &[&str], line_idx: usize) -> String {
    for i in (0..=line_idx.min(lines.len().saturating_sub(1))).rev() {
        if let Some(caps) = PROCEDURE_DECL.captures(lines[i]) {
            return caps[2].to_lowercase();
        }
    }
    "unknown".to_string()
}

/// Classify the I/O operation on a line containing a filename literal
fn classify_line(line: &str) -> IoOp {
    static WRITE_STMT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bwrite\s*\(").expect("valid regex"));
    static READ_STMT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bread\s*\(").expect("valid regex"));
    static INQUIRE_STMT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\binquire\s*\(").expect("valid regex"));
    static CLOSE_STMT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bclose\s*\(").expect("valid regex"));

    if OPEN_STMT.is_match(line) {
        IoOp::Open
    } else if WRITE_STMT.is_match(line) {
        IoOp::Write
    } else if READ_STMT.is_match(line) {
        IoOp::Read
    } else if INQUIRE_STMT.is_match(line) {
        IoOp::Inquire
    } else if CLOSE_STMT.is_match(line) {
        IoOp::Close
    } else {
        IoOp::Reference
    }
}

/// Scanner for file-I/O references across a Fortran source tree
pub struct IoRefScanner {
    src_dir: PathBuf,
}

impl IoRefScanner {
    pub fn new(src_dir: impl AsRef<Path>) -> Self {
        Self {
            src_dir: src_dir.as_ref().to_path_buf(),
        }
    }

    /// Scan every Fortran source under the root for filename literals and
    /// `file=variable` references. Unreadable files are logged and skipped.
    pub fn scan(&self) -> Result<IoRefIndex> {
        if !self.src_dir.exists() {
            return Err(FortranError::MissingSourceDir(self.src_dir.clone()));
        }

        let mut index = IoRefIndex::default();
        for path in SourceScanner::new(&self.src_dir).scan() {
            if let Err(e) = self.scan_file(&path, &mut index) {
                log::warn!("Error processing {}: {e}", path.display());
            }
        }

        log::info!(
            "Found {} unique filenames and {} variable references",
            index.files.len(),
            index.variables.len()
        );
        Ok(index)
    }

    fn scan_file(&self, path: &Path, index: &mut IoRefIndex) -> Result<()> {
        let content = read_source(path)?;
        let lines: Vec<&str> = content.lines().collect();
        let rel = self.relative(path);

        for (idx, line) in lines.iter().enumerate() {
            if is_comment_line(line) {
                continue;
            }

            if OPEN_STMT.is_match(line) {
                match open_target(line) {
                    Some(OpenTarget::Literal(filename)) => {
                        index.files.entry(filename).or_default().push(RefLocation {
                            source: rel.clone(),
                            line: idx + 1,
                            procedure: enclosing_procedure(&lines, idx),
                            op: IoOp::Open,
                        });
                    }
                    Some(OpenTarget::Variable(var)) => {
                        index
                            .variables
                            .entry(var.to_lowercase())
                            .or_default()
                            .push(RefLocation {
                                source: rel.clone(),
                                line: idx + 1,
                                procedure: enclosing_procedure(&lines, idx),
                                op: IoOp::Open,
                            });
                    }
                    None => {}
                }
                continue;
            }

            for caps in EXTENSION_LITERAL.captures_iter(line) {
                let filename = caps[1].to_string();
                index.files.entry(filename).or_default().push(RefLocation {
                    source: rel.clone(),
                    line: idx + 1,
                    procedure: enclosing_procedure(&lines, idx),
                    op: classify_line(line),
                });
            }
        }

        Ok(())
    }

    /// Collect hardcoded `open(unit, file="name")` statements, skipping
    /// expressions and path-like names. Keys are lowercased filenames.
    pub fn scan_hardcoded(&self) -> Result<BTreeMap<String, Vec<HardcodedRef>>> {
        if !self.src_dir.exists() {
            return Err(FortranError::MissingSourceDir(self.src_dir.clone()));
        }

        let mut hardcoded: BTreeMap<String, Vec<HardcodedRef>> = BTreeMap::new();
        for path in SourceScanner::new(&self.src_dir).scan() {
            let content = match read_source(&path) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Error processing {}: {e}", path.display());
                    continue;
                }
            };
            let rel = self.relative(&path);

            for (idx, line) in content.lines().enumerate() {
                let Some(caps) = HARDCODED_OPEN.captures(line) else {
                    continue;
                };
                let filename = caps[1].trim().to_string();
                let lowered = filename.to_lowercase();

                // variable expressions masquerading as literals
                if ["trim", "adjustl", "//", "%"].iter().any(|x| lowered.contains(x)) {
                    continue;
                }
                // paths and dotfiles
                if filename.contains('/') || filename.starts_with('.') {
                    continue;
                }

                hardcoded.entry(lowered).or_default().push(HardcodedRef {
                    source: rel.clone(),
                    line: idx + 1,
                    statement: line.trim().to_string(),
                });
            }
        }

        Ok(hardcoded)
    }

    /// Per-occurrence scan of I/O statements whose `file=` argument is a
    /// string literal, keeping the statement text for reporting.
    pub fn scan_fio_strings(&self) -> Result<Vec<FioOccurrence>> {
        static FIO_WITH_LITERAL: Lazy<Vec<(IoOp, Regex)>> = Lazy::new(|| {
            let pattern = |stmt: &str| {
                Regex::new(&format!(
                    r#"(?i){stmt}\s*\([^)]*file\s*=\s*["']([^"']+)["'][^)]*\)"#
                ))
                .expect("valid regex")
            };
            vec![
                (IoOp::Open, pattern("open")),
                (IoOp::Inquire, pattern("inquire")),
                (IoOp::Read, pattern("read")),
                (IoOp::Write, pattern("write")),
                (IoOp::Close, pattern("close")),
            ]
        });

        if !self.src_dir.exists() {
            return Err(FortranError::MissingSourceDir(self.src_dir.clone()));
        }

        let mut occurrences = Vec::new();
        for path in SourceScanner::new(&self.src_dir).scan() {
            let content = match read_source(&path) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Error analyzing {}: {e}", path.display());
                    continue;
                }
            };
            let rel = self.relative(&path);

            for (idx, line) in content.lines().enumerate() {
                if is_comment_line(line) {
                    continue;
                }
                for (op, pattern) in FIO_WITH_LITERAL.iter() {
                    for caps in pattern.captures_iter(line) {
                        occurrences.push(FioOccurrence {
                            source: rel.clone(),
                            line: idx + 1,
                            statement: line.trim().to_string(),
                            op: *op,
                            literal: caps[1].to_string(),
                        });
                    }
                }
            }
        }

        occurrences.sort_by(|a, b| a.source.cmp(&b.source).then(a.line.cmp(&b.line)));
        Ok(occurrences)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.src_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn fixture(body: &str) -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("hru_read.f90"), body).unwrap();
        temp
    }

    #[test]
    fn literal_open_is_recorded_with_procedure() {
        let temp = fixture(
            "      subroutine hru_read\n\
                   open (107, file = \"hru.con\")\n\
                   end subroutine hru_read\n",
        );

        let index = IoRefScanner::new(temp.path()).scan().unwrap();
        let refs = &index.files["hru.con"];
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].procedure, "hru_read");
        assert_eq!(refs[0].line, 2);
        assert_eq!(refs[0].op, IoOp::Open);
    }

    #[test]
    fn variable_open_goes_to_variable_refs() {
        let temp = fixture(
            "      subroutine time_read\n\
                   open (107, file = in_sim%time)\n\
                   end subroutine time_read\n",
        );

        let index = IoRefScanner::new(temp.path()).scan().unwrap();
        assert!(index.files.is_empty());
        assert!(index.variables.contains_key("in_sim"));
    }

    #[test]
    fn extension_literal_outside_open_is_a_reference() {
        let temp = fixture(
            "      subroutine header_write\n\
                   write (4000,*) \"basin_wb.txt\"\n\
                   title = \"plants.plt\"\n\
                   end subroutine header_write\n",
        );

        let index = IoRefScanner::new(temp.path()).scan().unwrap();
        assert_eq!(index.files["basin_wb.txt"][0].op, IoOp::Write);
        assert_eq!(index.files["plants.plt"][0].op, IoOp::Reference);
    }

    #[test]
    fn hardcoded_scan_skips_expressions_and_paths() {
        let temp = fixture(
            "      subroutine out_open\n\
                   open (9000, file = \"channel.out\")\n\
                   open (9001, file = trim(prefix)//\"x.out\")\n\
                   open (9002, file = \"data/extra.out\")\n\
                   end subroutine out_open\n",
        );

        let hardcoded = IoRefScanner::new(temp.path()).scan_hardcoded().unwrap();
        assert_eq!(hardcoded.len(), 1);
        assert!(hardcoded.contains_key("channel.out"));
    }

    #[test]
    fn fio_string_scan_keeps_statement_text() {
        let temp = fixture(
            "      subroutine cio_open\n\
                   open (107, file = \"file.cio\")\n\
                   inquire (file = \"file.cio\", exist = i_exist)\n\
                   end subroutine cio_open\n",
        );

        let occurrences = IoRefScanner::new(temp.path()).scan_fio_strings().unwrap();
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].op, IoOp::Open);
        assert_eq!(occurrences[1].op, IoOp::Inquire);
        assert!(occurrences[0].statement.contains("open (107"));
        assert_eq!(occurrences[0].literal, "file.cio");
    }

    #[test]
    fn missing_source_dir_is_a_typed_error() {
        let err = IoRefScanner::new("/nonexistent/swat/src").scan().unwrap_err();
        assert!(matches!(err, crate::FortranError::MissingSourceDir(_)));
    }

    #[test]
    fn enclosing_procedure_falls_back_to_unknown() {
        let lines = vec!["      integer :: eof", "      open (1, file = \"x.con\")"];
        assert_eq!(enclosing_procedure(&lines, 1), "unknown");
    }
}
