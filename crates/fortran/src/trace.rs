use crate::error::{FortranError, Result};
use crate::module_files::{self, InputFileEntry};
use crate::scanner::{read_source, SourceScanner};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Resolved I/O trace for one input file: where its name is declared, which
/// subroutine opens it, and the read statements on that unit.
#[derive(Debug, Clone, Serialize)]
pub struct IoTrace {
    pub filename: String,
    /// Fully qualified file variable, e.g. `in_sim%time`
    pub variable: String,
    /// Owning derived type in the input file module
    pub derived_type: String,
    pub module_file: String,
    pub reader_file: Option<String>,
    pub unit: Option<String>,
    pub open_statement: Option<String>,
    pub read_statements: Vec<String>,
}

/// Generator resolving a filename through the input file module to the
/// subroutine that reads it
pub struct IoTraceGenerator {
    src_dir: PathBuf,
    module_file: PathBuf,
}

impl IoTraceGenerator {
    pub fn new(src_dir: impl AsRef<Path>) -> Self {
        let src_dir = src_dir.as_ref().to_path_buf();
        let module_file = src_dir.join("input_file_module.f90");
        Self {
            src_dir,
            module_file,
        }
    }

    pub fn generate(&self, filename: &str) -> Result<IoTrace> {
        let entry = self.find_file_variable(filename)?;
        let mut trace = IoTrace {
            filename: filename.to_string(),
            variable: entry.variable.clone(),
            derived_type: entry.group.clone(),
            module_file: self.module_file.display().to_string(),
            reader_file: None,
            unit: None,
            open_statement: None,
            read_statements: Vec::new(),
        };

        let Some(reader) = self.find_read_subroutine(&entry.variable)? else {
            return Err(FortranError::NoReaderFound(entry.variable));
        };
        trace.reader_file = Some(
            reader
                .strip_prefix(&self.src_dir)
                .unwrap_or(&reader)
                .to_string_lossy()
                .into_owned(),
        );

        let content = read_source(&reader)?;
        self.extract_io_statements(&content, &entry.variable, &mut trace);
        Ok(trace)
    }

    /// Resolve a filename to its declaration in the input file module
    fn find_file_variable(&self, filename: &str) -> Result<InputFileEntry> {
        let entries = module_files::parse_input_files(&self.module_file)?;
        entries
            .into_iter()
            .find(|entry| entry.filename == filename)
            .ok_or_else(|| FortranError::UnknownInputFile(filename.to_string()))
    }

    /// First source file whose `open` statement uses the file variable
    fn find_read_subroutine(&self, variable: &str) -> Result<Option<PathBuf>> {
        let open_with_var = Regex::new(&format!(
            r"(?i)open\s*\([^)]*{}",
            regex::escape(variable)
        ))
        .expect("valid regex");

        for path in SourceScanner::new(&self.src_dir).scan() {
            let content = match read_source(&path) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Error reading {}: {e}", path.display());
                    continue;
                }
            };
            if content.contains(variable) && open_with_var.is_match(&content) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn extract_io_statements(&self, content: &str, variable: &str, trace: &mut IoTrace) {
        let open_pattern = Regex::new(&format!(
            r"(?is)open\s*\(\s*(?:unit\s*=\s*)?(\d+)\s*,.*?file\s*=\s*{}",
            regex::escape(variable)
        ))
        .expect("valid regex");

        if let Some(caps) = open_pattern.captures(content) {
            trace.unit = Some(caps[1].to_string());
            trace.open_statement = Some(caps[0].trim().to_string());
        }

        if let Some(unit) = trace.unit.clone() {
            let read_pattern =
                Regex::new(&format!(r"(?i)read\s*\(\s*{unit}\b[^)]*\).*")).expect("valid regex");
            for line in content.lines() {
                if let Some(m) = read_pattern.find(line) {
                    trace.read_statements.push(m.as_str().trim().to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn fixture() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("input_file_module.f90"),
            "      module input_file_module\n\
                   type input_sim\n\
                     character(len=25) :: time = \"time.sim\"\n\
                   end type input_sim\n\
                   type (input_sim) :: in_sim\n\
                   end module input_file_module\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("time_read.f90"),
            "      subroutine time_read\n\
                   open (107, file = in_sim%time)\n\
                   read (107,*,iostat=eof) titldum\n\
                   read (107,*,iostat=eof) time%day_start, time%step\n\
                   close (107)\n\
                   end subroutine time_read\n",
        )
        .unwrap();
        temp
    }

    #[test]
    fn traces_a_file_to_its_reader() {
        let temp = fixture();
        let trace = IoTraceGenerator::new(temp.path()).generate("time.sim").unwrap();

        assert_eq!(trace.variable, "in_sim%time");
        assert_eq!(trace.derived_type, "input_sim");
        assert_eq!(trace.reader_file.as_deref(), Some("time_read.f90"));
        assert_eq!(trace.unit.as_deref(), Some("107"));
        assert_eq!(trace.read_statements.len(), 2);
    }

    #[test]
    fn unknown_filename_is_a_typed_error() {
        let temp = fixture();
        let err = IoTraceGenerator::new(temp.path())
            .generate("no_such.con")
            .unwrap_err();
        assert!(matches!(err, FortranError::UnknownInputFile(_)));
    }
}
