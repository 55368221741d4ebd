use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Scanner for finding Fortran source files under a SWAT+ tree
pub struct SourceScanner {
    root: PathBuf,
}

impl SourceScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the tree for Fortran sources (.gitignore aware), sorted by path
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);
        builder.filter_entry(move |entry| !SourceScanner::is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > MAX_FILE_SIZE_BYTES {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                MAX_FILE_SIZE_BYTES
                            );
                            continue;
                        }
                    }

                    if !Self::is_fortran_source(path) {
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("Found {} Fortran source files", files.len());
        files
    }

    /// Check for a Fortran extension (fixed and free form, either case)
    fn is_fortran_source(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FORTRAN_EXTENSIONS.iter().any(|c| c.eq_ignore_ascii_case(ext)))
    }

    fn is_ignored_scope(path: &Path, root: &Path) -> bool {
        if let Ok(relative) = path.strip_prefix(root) {
            for component in relative.components() {
                if let std::path::Component::Normal(name) = component {
                    let lowered = name.to_string_lossy().to_lowercase();
                    if IGNORED_SCOPES.iter().any(|ignored| ignored == &lowered) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

/// Read a source file leniently: non-UTF8 bytes are replaced, read errors bubble up.
pub fn read_source(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Fortran comment line in either fixed or free form
pub fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty()
        || trimmed.starts_with('!')
        || line.starts_with('c')
        || line.starts_with('C')
        || line.starts_with('*')
}

const IGNORED_SCOPES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    "build",
    "dist",
    "cmake-build-debug",
    "cmake-build-release",
    "doc",
    "docs",
];

const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MB

const FORTRAN_EXTENSIONS: &[&str] = &["f90", "f"];

#[cfg(test)]
mod tests {
    use super::SourceScanner;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_fortran_sources_only() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("hru_read.f90"), b"subroutine hru_read\n").unwrap();
        fs::write(temp.path().join("legacy.F"), b"      program legacy\n").unwrap();
        fs::write(temp.path().join("notes.txt"), b"not source").unwrap();

        let scanner = SourceScanner::new(temp.path());
        let files = scanner.scan();

        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|p| p.ends_with("hru_read.f90")));
        assert!(files.iter().any(|p| p.ends_with("legacy.F")));
    }

    #[test]
    fn skips_build_scopes() {
        let temp = tempdir().unwrap();
        let build = temp.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("generated.f90"), b"subroutine generated\n").unwrap();
        fs::write(temp.path().join("main.f90"), b"program main\n").unwrap();

        let scanner = SourceScanner::new(temp.path());
        let files = scanner.scan();

        assert!(files.iter().all(|p| !p.to_string_lossy().contains("build")));
        assert_eq!(files.len(), 1);
    }
}
