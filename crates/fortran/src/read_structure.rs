use crate::error::{FortranError, Result};
use crate::scanner::{is_comment_line, read_source, SourceScanner};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How many lines past an `open` statement to look for reads on its unit
const READ_LOOKAHEAD_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadKind {
    Header,
    TitleOrSkip,
    Data,
}

impl ReadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadKind::Header => "header",
            ReadKind::TitleOrSkip => "title_or_skip",
            ReadKind::Data => "data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFormat {
    FreeFormat,
    Formatted,
    Unformatted,
}

impl ReadFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadFormat::FreeFormat => "free_format",
            ReadFormat::Formatted => "formatted",
            ReadFormat::Unformatted => "unformatted",
        }
    }
}

/// One `read` statement following an `open`
#[derive(Debug, Clone, Serialize)]
pub struct ReadInfo {
    pub line: usize,
    pub statement: String,
    pub kind: ReadKind,
    pub format: ReadFormat,
    pub variables: Vec<String>,
    pub data_types: Vec<String>,
}

/// An `open` statement with a string-literal filename and its read structure
#[derive(Debug, Clone, Serialize)]
pub struct OpenInfo {
    pub line: usize,
    pub statement: String,
    pub unit: String,
    pub filename: String,
    pub reads: Vec<ReadInfo>,
}

/// All literal opens found in one source file
#[derive(Debug, Clone, Serialize)]
pub struct FileReadStructure {
    pub file: String,
    pub opens: Vec<OpenInfo>,
}

static OPEN_WITH_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)open\s*\(\s*([^,\s]+)\s*,\s*file\s*=\s*["']([^"']+)["'][^)]*\)"#)
        .expect("valid regex")
});
static READ_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)read\s*\(\s*([^,\s)]+)\s*[,)]").expect("valid regex"));
static PROCEDURE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(end\s+)?(subroutine|function)\b").expect("valid regex")
});

/// Analyzer for the read structure that follows literal `open` statements
pub struct ReadStructureAnalyzer {
    src_dir: PathBuf,
}

impl ReadStructureAnalyzer {
    pub fn new(src_dir: impl AsRef<Path>) -> Self {
        Self {
            src_dir: src_dir.as_ref().to_path_buf(),
        }
    }

    pub fn analyze(&self) -> Result<Vec<FileReadStructure>> {
        if !self.src_dir.exists() {
            return Err(FortranError::MissingSourceDir(self.src_dir.clone()));
        }

        let mut results = Vec::new();
        let files = SourceScanner::new(&self.src_dir).scan();
        for path in &files {
            let content = match read_source(path) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Error analyzing {}: {e}", path.display());
                    continue;
                }
            };
            let opens = analyze_source(&content);
            if opens.is_empty() {
                continue;
            }
            let rel = path
                .strip_prefix(&self.src_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned();
            results.push(FileReadStructure { file: rel, opens });
        }

        let total_opens: usize = results.iter().map(|r| r.opens.len()).sum();
        log::info!(
            "Analyzed {} files; {} with literal opens ({} open statements)",
            files.len(),
            results.len(),
            total_opens
        );
        Ok(results)
    }
}

/// Find every literal `open` in a source and attach its read structure
pub fn analyze_source(content: &str) -> Vec<OpenInfo> {
    let lines: Vec<&str> = content.lines().collect();
    let mut opens = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if is_comment_line(line) {
            continue;
        }
        let Some(caps) = OPEN_WITH_LITERAL.captures(line) else {
            continue;
        };
        let unit = caps[1].to_string();
        let filename = caps[2].to_string();
        let reads = read_structure_after(&lines, idx, &unit);
        opens.push(OpenInfo {
            line: idx + 1,
            statement: line.trim().to_string(),
            unit,
            filename,
            reads,
        });
    }

    opens
}

fn read_structure_after(lines: &[&str], open_idx: usize, unit: &str) -> Vec<ReadInfo> {
    let mut reads = Vec::new();
    let end = (open_idx + 1 + READ_LOOKAHEAD_LINES).min(lines.len());

    for (idx, raw) in lines.iter().enumerate().take(end).skip(open_idx + 1) {
        let line = raw.trim();
        if line.is_empty() || is_comment_line(raw) {
            continue;
        }

        let lowered = line.to_lowercase();
        if lowered.contains("close") && line.contains(unit) {
            break;
        }
        if let Some(caps) = READ_UNIT.captures(line) {
            if caps[1].trim() == unit {
                reads.push(analyze_read_statement(line, idx + 1));
                continue;
            }
        }
        if lowered.contains("open") && line.contains('=') {
            break;
        }
        if PROCEDURE_END.is_match(line) {
            break;
        }
    }

    reads
}

fn analyze_read_statement(line: &str, line_num: usize) -> ReadInfo {
    let variables = read_variables(line);

    let kind = if line.to_lowercase().contains("header")
        || variables.iter().any(|v| v.to_lowercase().contains("header"))
    {
        ReadKind::Header
    } else if variables.is_empty()
        || variables
            .iter()
            .all(|v| matches!(v.to_lowercase().as_str(), "titldum" | "titldum1" | "titldum2"))
    {
        ReadKind::TitleOrSkip
    } else {
        ReadKind::Data
    };

    let format = if line.contains('*') {
        ReadFormat::FreeFormat
    } else if line.contains('\'') || line.contains('"') || line.contains("fmt=") {
        ReadFormat::Formatted
    } else {
        ReadFormat::Unformatted
    };

    let data_types = infer_data_types(line, &variables);

    ReadInfo {
        line: line_num,
        statement: line.to_string(),
        kind,
        format,
        variables,
        data_types,
    }
}

/// Variable list after the control parens of a read statement
fn read_variables(line: &str) -> Vec<String> {
    let Some((_, after)) = line.split_once(')') else {
        return Vec::new();
    };
    after
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Coarse data type inference from Fortran naming conventions plus any
/// trailing type comment
fn infer_data_types(line: &str, variables: &[String]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    let mut push = |t: &str| {
        if !types.iter().any(|existing| existing == t) {
            types.push(t.to_string());
        }
    };

    for var in variables {
        let v = var.to_lowercase();
        if v.contains("flag") || v.contains("exist") {
            push("logical");
        } else if v.starts_with(['i', 'j', 'k', 'n', 'm'])
            || v.contains("id")
            || v.contains("num")
            || v.contains("count")
        {
            push("integer");
        } else if v.starts_with(['x', 'y', 'z', 'r'])
            || ["coord", "dist", "size", "area", "volume", "depth", "width", "length", "thick"]
                .iter()
                .any(|kw| v.contains(kw))
        {
            push("real");
        } else if v.starts_with("c")
            || v.starts_with("str")
            || ["name", "header", "title", "type", "file"]
                .iter()
                .any(|kw| v.contains(kw))
        {
            push("character");
        } else {
            push("unknown");
        }
    }

    if let Some((_, comment)) = line.split_once('!') {
        let comment = comment.to_lowercase();
        for dtype in ["integer", "real", "character", "logical"] {
            if comment.contains(dtype) {
                push(dtype);
            }
        }
        if comment.contains("double precision") {
            push("double_precision");
        }
    }

    if types.is_empty() {
        types.push("unknown".to_string());
    }
    types
}

/// Aggregate counts across a full analysis, for the summary artifact
#[derive(Debug, Default, Serialize)]
pub struct ReadStructureSummary {
    pub files_with_opens: usize,
    pub total_opens: usize,
    pub header_reads: usize,
    pub data_reads: usize,
    pub title_skip_reads: usize,
    pub input_files: usize,
    pub output_files: usize,
    pub data_type_counts: BTreeMap<String, usize>,
}

pub fn summarize(results: &[FileReadStructure]) -> ReadStructureSummary {
    let mut summary = ReadStructureSummary {
        files_with_opens: results.len(),
        ..Default::default()
    };

    for file in results {
        for open in &file.opens {
            summary.total_opens += 1;
            if open.reads.is_empty() {
                // no reads after the open: likely an output file
                summary.output_files += 1;
            } else {
                summary.input_files += 1;
            }
            for read in &open.reads {
                match read.kind {
                    ReadKind::Header => summary.header_reads += 1,
                    ReadKind::TitleOrSkip => summary.title_skip_reads += 1,
                    ReadKind::Data => summary.data_reads += 1,
                }
                for dtype in &read.data_types {
                    *summary.data_type_counts.entry(dtype.clone()).or_default() += 1;
                }
            }
        }
    }

    summary
}
