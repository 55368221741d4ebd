use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

/// File category buckets used for commit classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Input,
    Output,
    Source,
    Other,
}

static INPUT_EXTENSIONS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "con", "cli", "dat", "cha", "res", "hru", "rtu", "dr", "def", "ele", "wet", "bsn", "prt",
        "cnt", "cs", "sim", "wgn", "sta", "pet", "pcp", "tmp", "slr", "hmd", "wnd", "sol", "dtl",
        "lum", "sch", "cal", "sft", "ops", "mgt", "pst", "aqu", "exco", "rec",
    ]
    .into_iter()
    .collect()
});

static OUTPUT_EXTENSIONS: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| ["txt", "out"].into_iter().collect());

static SOURCE_EXTENSIONS: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| ["f90", "f"].into_iter().collect());

static SUBROUTINE_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)subroutine\s+(\w+)").expect("valid regex"));
static MODULE_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*module\s+(\w+)").expect("valid regex"));

/// Classify a path by its extension
pub fn classify_file(filename: &str) -> FileCategory {
    let Some(ext) = filename.rsplit_once('.').map(|(_, ext)| ext) else {
        return FileCategory::Other;
    };
    let lowered = ext.to_lowercase();
    if INPUT_EXTENSIONS.contains(lowered.as_str()) {
        FileCategory::Input
    } else if OUTPUT_EXTENSIONS.contains(lowered.as_str()) {
        FileCategory::Output
    } else if SOURCE_EXTENSIONS.contains(lowered.as_str()) {
        FileCategory::Source
    } else {
        FileCategory::Other
    }
}

/// File changes between two commits, from `git diff --name-status`
#[derive(Debug, Default)]
pub struct DiffChanges {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub renamed: Vec<(String, String)>,
}

pub fn parse_name_status(output: &str) -> DiffChanges {
    let mut changes = DiffChanges::default();
    for line in output.lines() {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 2 {
            continue;
        }
        match parts[0] {
            "A" => changes.added.push(parts[1].to_string()),
            "M" => changes.modified.push(parts[1].to_string()),
            "D" => changes.deleted.push(parts[1].to_string()),
            status if status.starts_with('R') && parts.len() >= 3 => {
                changes
                    .renamed
                    .push((parts[1].to_string(), parts[2].to_string()));
            }
            _ => {}
        }
    }
    changes
}

/// Subroutine/module declarations added and removed across the diff
#[derive(Debug, Default)]
pub struct SourceDecls {
    pub subroutines_added: Vec<String>,
    pub subroutines_removed: Vec<String>,
    pub modules_added: Vec<String>,
    pub modules_removed: Vec<String>,
}

/// Scan unified-diff text for declaration lines. Added lines start with `+`,
/// removed with `-`; the `+++`/`---` file markers are skipped.
pub fn scan_diff_for_decls(diff: &str, file: &str, decls: &mut SourceDecls) {
    for line in diff.lines() {
        if let Some(body) = line.strip_prefix('+') {
            if line.starts_with("+++") {
                continue;
            }
            collect_decls(body, file, &mut decls.subroutines_added, &mut decls.modules_added);
        } else if let Some(body) = line.strip_prefix('-') {
            if line.starts_with("---") {
                continue;
            }
            collect_decls(
                body,
                file,
                &mut decls.subroutines_removed,
                &mut decls.modules_removed,
            );
        }
    }
}

/// Scan full file content (new or deleted files) for declarations
pub fn scan_content_for_decls(
    content: &str,
    file: &str,
    note: &str,
    subroutines: &mut Vec<String>,
    modules: &mut Vec<String>,
) {
    for line in content.lines() {
        if let Some(caps) = SUBROUTINE_DECL.captures(line) {
            subroutines.push(format!("{} in {file} ({note})", &caps[1]));
        }
        if let Some(caps) = MODULE_DECL.captures(line) {
            if !line.to_lowercase().contains("end module") {
                modules.push(format!("{} in {file} ({note})", &caps[1]));
            }
        }
    }
}

fn collect_decls(body: &str, file: &str, subroutines: &mut Vec<String>, modules: &mut Vec<String>) {
    if let Some(caps) = SUBROUTINE_DECL.captures(body) {
        subroutines.push(format!("{} in {file}", &caps[1]));
    }
    if let Some(caps) = MODULE_DECL.captures(body) {
        if !body.to_lowercase().contains("end module") {
            modules.push(format!("{} in {file}", &caps[1]));
        }
    }
}

/// Classified analysis of the changes between two commits
#[derive(Debug, Default)]
pub struct CommitAnalysis {
    pub new_input_files: Vec<String>,
    pub new_output_files: Vec<String>,
    pub existing_input_changes: Vec<String>,
    pub existing_output_changes: Vec<String>,
    pub other_added: Vec<String>,
    pub other_modified: Vec<String>,
    pub other_deleted: Vec<String>,
    pub renamed: Vec<(String, String)>,
    pub decls: SourceDecls,
}

fn run_git(repo: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;
    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run the full commit comparison against a git repository
pub fn analyze(repo: &Path, commit1: &str, commit2: &str) -> Result<CommitAnalysis> {
    let name_status = run_git(repo, &["diff", "--name-status", commit1, commit2])?;
    let changes = parse_name_status(&name_status);

    let mut analysis = CommitAnalysis {
        renamed: changes.renamed.clone(),
        ..CommitAnalysis::default()
    };

    for file in &changes.added {
        match classify_file(file) {
            FileCategory::Input => analysis.new_input_files.push(file.clone()),
            FileCategory::Output => analysis.new_output_files.push(file.clone()),
            _ => analysis.other_added.push(file.clone()),
        }
    }
    for file in &changes.modified {
        match classify_file(file) {
            FileCategory::Input => analysis.existing_input_changes.push(file.clone()),
            FileCategory::Output => analysis.existing_output_changes.push(file.clone()),
            _ => analysis.other_modified.push(file.clone()),
        }
    }
    for file in &changes.deleted {
        if !matches!(
            classify_file(file),
            FileCategory::Input | FileCategory::Output
        ) {
            analysis.other_deleted.push(file.clone());
        }
    }

    // declaration-level scan over source files
    for file in &changes.modified {
        if classify_file(file) != FileCategory::Source {
            continue;
        }
        match run_git(repo, &["diff", commit1, commit2, "--", file]) {
            Ok(diff) => scan_diff_for_decls(&diff, file, &mut analysis.decls),
            Err(e) => log::warn!("Skipping diff of {file}: {e}"),
        }
    }
    for file in &changes.added {
        if classify_file(file) != FileCategory::Source {
            continue;
        }
        match run_git(repo, &["show", &format!("{commit2}:{file}")]) {
            Ok(content) => scan_content_for_decls(
                &content,
                file,
                "new file",
                &mut analysis.decls.subroutines_added,
                &mut analysis.decls.modules_added,
            ),
            Err(e) => log::warn!("Skipping new file {file}: {e}"),
        }
    }
    for file in &changes.deleted {
        if classify_file(file) != FileCategory::Source {
            continue;
        }
        match run_git(repo, &["show", &format!("{commit1}:{file}")]) {
            Ok(content) => scan_content_for_decls(
                &content,
                file,
                "file deleted",
                &mut analysis.decls.subroutines_removed,
                &mut analysis.decls.modules_removed,
            ),
            Err(e) => log::warn!("Skipping deleted file {file}: {e}"),
        }
    }

    Ok(analysis)
}

/// Report in the five-section layout
pub fn render_report(commit1: &str, commit2: &str, analysis: &CommitAnalysis) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Analyzing changes between {commit1} and {commit2}\n\n"
    ));
    out.push_str(&"=".repeat(80));
    out.push('\n');

    let section = |out: &mut String, title: &str| {
        out.push_str(&format!("\n{title}\n"));
        out.push_str(&"-".repeat(80));
        out.push('\n');
    };
    let listing = |out: &mut String, prefix: &str, files: &[String]| {
        if files.is_empty() {
            out.push_str("  (none)\n");
        } else {
            let mut sorted = files.to_vec();
            sorted.sort();
            for file in sorted {
                out.push_str(&format!("  {prefix} {file}\n"));
            }
        }
    };

    section(&mut out, "I. NEW_INPUT_FILES");
    listing(&mut out, "+", &analysis.new_input_files);

    section(&mut out, "II. NEW_OUTPUT_FILES");
    listing(&mut out, "+", &analysis.new_output_files);

    section(&mut out, "III. EXISTING OUTPUT FILES");
    listing(&mut out, "M", &analysis.existing_output_changes);

    section(&mut out, "IV. EXISTING INPUT FILES");
    listing(&mut out, "M", &analysis.existing_input_changes);

    section(&mut out, "V. OTHER CHANGES");
    let decls = &analysis.decls;
    let mut any_other = false;
    let decl_block =
        |out: &mut String, any: &mut bool, title: &str, prefix: &str, items: &[String]| {
            if !items.is_empty() {
                *any = true;
                out.push_str(&format!("\n{title}:\n"));
                for item in items {
                    out.push_str(&format!("  {prefix} {item}\n"));
                }
            }
        };
    decl_block(&mut out, &mut any_other, "Added subroutines", "+", &decls.subroutines_added);
    decl_block(&mut out, &mut any_other, "Removed subroutines", "-", &decls.subroutines_removed);
    decl_block(&mut out, &mut any_other, "Added modules", "+", &decls.modules_added);
    decl_block(&mut out, &mut any_other, "Removed modules", "-", &decls.modules_removed);
    decl_block(&mut out, &mut any_other, "Other added files", "+", &analysis.other_added);
    decl_block(&mut out, &mut any_other, "Other modified files", "M", &analysis.other_modified);
    decl_block(&mut out, &mut any_other, "Other deleted files", "-", &analysis.other_deleted);

    if !analysis.renamed.is_empty() {
        any_other = true;
        out.push_str("\nRenamed files:\n");
        for (old, new) in &analysis.renamed {
            out.push_str(&format!("  R {old} -> {new}\n"));
        }
    }
    if !any_other {
        out.push_str("  (none)\n");
    }

    out.push('\n');
    out.push_str(&"=".repeat(80));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extensions_map_to_categories() {
        assert_eq!(classify_file("hru.con"), FileCategory::Input);
        assert_eq!(classify_file("channel.out"), FileCategory::Output);
        assert_eq!(classify_file("basin_wb.txt"), FileCategory::Output);
        assert_eq!(classify_file("hru_control.f90"), FileCategory::Source);
        assert_eq!(classify_file("README.md"), FileCategory::Other);
        assert_eq!(classify_file("Makefile"), FileCategory::Other);
    }

    #[test]
    fn name_status_output_is_parsed() {
        let output = "A\tdata/new.con\nM\tsrc/hru_control.f90\nD\told.out\nR100\ta.f90\tb.f90\n";
        let changes = parse_name_status(output);

        assert_eq!(changes.added, vec!["data/new.con"]);
        assert_eq!(changes.modified, vec!["src/hru_control.f90"]);
        assert_eq!(changes.deleted, vec!["old.out"]);
        assert_eq!(
            changes.renamed,
            vec![("a.f90".to_string(), "b.f90".to_string())]
        );
    }

    #[test]
    fn added_diff_line_reports_added_subroutine() {
        let diff = "\
+++ b/src/pl_burnop.f90
--- a/src/pl_burnop.f90
+      subroutine pl_burnop_new
-      subroutine pl_burnop_old
+      module burn_data_module
";
        let mut decls = SourceDecls::default();
        scan_diff_for_decls(diff, "src/pl_burnop.f90", &mut decls);

        assert_eq!(
            decls.subroutines_added,
            vec!["pl_burnop_new in src/pl_burnop.f90"]
        );
        assert_eq!(
            decls.subroutines_removed,
            vec!["pl_burnop_old in src/pl_burnop.f90"]
        );
        assert_eq!(
            decls.modules_added,
            vec!["burn_data_module in src/pl_burnop.f90"]
        );
    }

    #[test]
    fn end_module_lines_are_not_declarations() {
        let mut decls = SourceDecls::default();
        scan_diff_for_decls("+      end module burn_data_module\n", "a.f90", &mut decls);
        assert!(decls.modules_added.is_empty());
    }

    #[test]
    fn report_renders_empty_sections() {
        let analysis = CommitAnalysis::default();
        let report = render_report("HEAD~1", "HEAD", &analysis);

        assert!(report.contains("I. NEW_INPUT_FILES"));
        assert!(report.contains("V. OTHER CHANGES"));
        assert!(report.matches("(none)").count() >= 5);
    }
}
