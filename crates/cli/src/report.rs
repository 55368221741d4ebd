use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use swatlens_fortran::compare::{matches_any, ListDiff};
use swatlens_fortran::io_refs::{FioOccurrence, HardcodedRef, IoRefIndex};
use swatlens_fortran::module_files::{group_title, InputFileEntry};
use swatlens_fortran::normalize_filename;
use swatlens_fortran::read_structure::{summarize, FileReadStructure};
use swatlens_fortran::IoTrace;

const BAR: usize = 80;

fn heavy_rule(out: &mut String) {
    out.push_str(&"=".repeat(BAR));
    out.push('\n');
}

fn light_rule(out: &mut String) {
    out.push_str(&"-".repeat(BAR));
    out.push('\n');
}

/// Full file-I/O analysis report: found files, variable references,
/// comparison against the provided list, summary statistics.
pub fn render_scan_report(index: &IoRefIndex, provided: &BTreeMap<String, u32>) -> String {
    let mut out = String::new();
    heavy_rule(&mut out);
    out.push_str("SWAT+ FILE I/O ANALYSIS REPORT\n");
    heavy_rule(&mut out);
    out.push('\n');

    // Section 1: files found in code, grouped by normalized pattern
    out.push_str("1. FILES FOUND IN CODE\n");
    light_rule(&mut out);

    let grouped = index.grouped();
    for (pattern, file_group) in &grouped {
        writeln!(out, "\nPattern: {pattern}").unwrap();
        for (filename, locations) in file_group {
            writeln!(out, "  File: {filename}").unwrap();
            for location in locations.iter().take(3) {
                writeln!(
                    out,
                    "    - {} :: {}() [line {}]",
                    location.source, location.procedure, location.line
                )
                .unwrap();
            }
            if locations.len() > 3 {
                writeln!(out, "    ... and {} more locations", locations.len() - 3).unwrap();
            }
        }
    }
    writeln!(out, "\nTotal unique filenames found: {}", index.files.len()).unwrap();
    writeln!(out, "Total unique patterns: {}", grouped.len()).unwrap();

    // Section 2: variable-based references
    out.push_str("\n\n2. VARIABLE-BASED FILE REFERENCES\n");
    light_rule(&mut out);
    for (var_name, locations) in index.variables.iter().take(20) {
        writeln!(out, "\nVariable: {var_name}").unwrap();
        for location in locations.iter().take(2) {
            writeln!(
                out,
                "  - {} :: {}() [line {}]",
                location.source, location.procedure, location.line
            )
            .unwrap();
        }
        if locations.len() > 2 {
            writeln!(out, "  ... and {} more locations", locations.len() - 2).unwrap();
        }
    }
    if index.variables.len() > 20 {
        writeln!(out, "\n... and {} more variables", index.variables.len() - 20).unwrap();
    }

    // Section 3: comparison with the provided list
    out.push_str("\n\n3. COMPARISON WITH PROVIDED LIST\n");
    light_rule(&mut out);

    let provided_normalized: BTreeMap<String, &str> = provided
        .keys()
        .map(|name| (normalize_filename(name), name.as_str()))
        .collect();
    let code_patterns: Vec<String> = grouped.keys().cloned().collect();

    let in_list_not_code: Vec<&str> = provided_normalized
        .iter()
        .filter(|(norm, _)| !matches_any(norm, &code_patterns))
        .map(|(_, orig)| *orig)
        .collect();

    out.push_str("\nFiles in PROVIDED LIST but NOT clearly found in CODE:\n");
    out.push_str("(These may be unused or use variable-based filenames)\n");
    for name in in_list_not_code.iter().take(50) {
        writeln!(out, "  - {name}").unwrap();
    }
    if in_list_not_code.len() > 50 {
        writeln!(out, "  ... and {} more", in_list_not_code.len() - 50).unwrap();
    }
    writeln!(out, "\nTotal: {} files", in_list_not_code.len()).unwrap();

    let provided_patterns: Vec<String> = provided_normalized.keys().cloned().collect();
    let in_code_not_list: Vec<&String> = code_patterns
        .iter()
        .filter(|pattern| !matches_any(pattern, &provided_patterns))
        .collect();

    out.push_str("\n\nFiles in CODE but NOT in provided LIST:\n");
    for pattern in &in_code_not_list {
        writeln!(out, "  - {pattern}").unwrap();
        if let Some(file_group) = grouped.get(*pattern) {
            let examples: Vec<&str> = file_group.iter().map(|(name, _)| *name).take(3).collect();
            writeln!(out, "    Examples: {}", examples.join(", ")).unwrap();
        }
    }
    writeln!(out, "\nTotal: {} file patterns", in_code_not_list.len()).unwrap();

    // Section 4: summary statistics
    out.push_str("\n\n4. SUMMARY STATISTICS\n");
    light_rule(&mut out);
    writeln!(out, "Files in provided list: {}", provided.len()).unwrap();
    writeln!(out, "Unique filenames found in code: {}", index.files.len()).unwrap();
    writeln!(out, "Unique file patterns in code: {}", grouped.len()).unwrap();
    writeln!(out, "Variable-based file references: {}", index.variables.len()).unwrap();
    writeln!(out, "Files potentially unused: {}", in_list_not_code.len()).unwrap();
    writeln!(out, "Files missing from list: {}", in_code_not_list.len()).unwrap();

    out.push('\n');
    heavy_rule(&mut out);
    out
}

/// Hardcoded-vs-configurable filename report
pub fn render_hardcoded_report(
    configurable: &BTreeSet<String>,
    hardcoded: &BTreeMap<String, Vec<HardcodedRef>>,
) -> String {
    let mut out = String::new();
    out.push_str("HARDCODED FILES IN SWAT+ SOURCE CODE\n");
    heavy_rule(&mut out);
    out.push('\n');
    out.push_str("Files that are hardcoded in the source and NOT configurable via file.cio\n\n");
    writeln!(
        out,
        "Step 1: Found {} configurable files in input_file_module.f90",
        configurable.len()
    )
    .unwrap();
    writeln!(
        out,
        "Step 2: Found {} hardcoded file references in source code\n",
        hardcoded.len()
    )
    .unwrap();

    let mut non_configurable = Vec::new();
    let mut also_configurable = Vec::new();
    for (filename, locations) in hardcoded {
        if configurable.contains(filename) {
            also_configurable.push((filename, locations));
        } else {
            non_configurable.push((filename, locations));
        }
    }
    non_configurable.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));
    also_configurable.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));

    heavy_rule(&mut out);
    out.push_str("HARDCODED FILES NOT IN FILE.CIO (NOT CONFIGURABLE)\n");
    heavy_rule(&mut out);
    writeln!(out, "\nTotal: {} files\n", non_configurable.len()).unwrap();

    for (filename, locations) in &non_configurable {
        writeln!(out, "File: {filename}").unwrap();
        writeln!(out, "  Referenced {} time(s):", locations.len()).unwrap();
        for reference in locations.iter().take(5) {
            writeln!(out, "    - {}:{}", reference.source, reference.line).unwrap();
            writeln!(out, "      {}", reference.statement).unwrap();
        }
        if locations.len() > 5 {
            writeln!(out, "    ... and {} more references", locations.len() - 5).unwrap();
        }
        out.push('\n');
    }

    out.push('\n');
    heavy_rule(&mut out);
    out.push_str("FILES THAT ARE BOTH HARDCODED AND CONFIGURABLE\n");
    heavy_rule(&mut out);
    writeln!(out, "\nTotal: {} files", also_configurable.len()).unwrap();
    out.push_str("(These have defaults in input_file_module.f90 but are also hardcoded)\n\n");
    for (filename, locations) in also_configurable.iter().take(20) {
        writeln!(out, "  {:<40} ({} reference(s))", filename, locations.len()).unwrap();
    }
    if also_configurable.len() > 20 {
        writeln!(out, "  ... and {} more", also_configurable.len() - 20).unwrap();
    }

    out.push('\n');
    heavy_rule(&mut out);
    out.push_str("SUMMARY\n");
    heavy_rule(&mut out);
    writeln!(
        out,
        "Configurable files (in input_file_module.f90):    {:4}",
        configurable.len()
    )
    .unwrap();
    writeln!(
        out,
        "Hardcoded files (literal strings in code):        {:4}",
        hardcoded.len()
    )
    .unwrap();
    writeln!(
        out,
        "  - NOT configurable (hardcoded only):             {:4}",
        non_configurable.len()
    )
    .unwrap();
    writeln!(
        out,
        "  - Also configurable (have defaults):             {:4}",
        also_configurable.len()
    )
    .unwrap();
    writeln!(
        out,
        "\nNON-CONFIGURABLE RATE: {:.1}%\n",
        non_configurable.len() as f64 / hardcoded.len().max(1) as f64 * 100.0
    )
    .unwrap();

    out
}

/// Grouped listing of configurable input files
pub fn render_input_listing(entries: &[InputFileEntry]) -> String {
    let mut out = String::new();
    out.push_str("SWAT+ INPUT FILES\n");
    heavy_rule(&mut out);
    out.push('\n');
    out.push_str("Extracted from: src/input_file_module.f90\n\n");

    let mut current_group: Option<&str> = None;
    for entry in entries {
        if current_group != Some(entry.group.as_str()) {
            if current_group.is_some() {
                out.push('\n');
            }
            current_group = Some(entry.group.as_str());
            out.push_str(group_title(&entry.group));
            out.push('\n');
            light_rule(&mut out);
        }
        writeln!(out, "  {:<35} -> {}", entry.variable, entry.filename).unwrap();
    }

    out.push('\n');
    heavy_rule(&mut out);
    writeln!(out, "Total input files: {}\n", entries.len()).unwrap();
    out
}

/// Set comparison of two filename lists with summary and extension breakdown
pub fn render_compare_report(provided: &BTreeSet<String>, reference: &BTreeSet<String>) -> String {
    let diff = ListDiff::compute(provided, reference);

    let mut out = String::new();
    out.push_str("COMPARISON: Provided List vs Reference List\n");
    heavy_rule(&mut out);
    out.push('\n');
    writeln!(out, "Files in provided list: {}", provided.len()).unwrap();
    writeln!(out, "Files in reference list: {}\n", reference.len()).unwrap();

    heavy_rule(&mut out);
    out.push_str("SECTION 1: FILES IN PROVIDED LIST BUT NOT IN REFERENCE\n");
    heavy_rule(&mut out);
    writeln!(out, "\nTotal: {} files\n", diff.only_in_a.len()).unwrap();
    if diff.only_in_a.is_empty() {
        out.push_str("  (None)\n");
    } else {
        for name in &diff.only_in_a {
            writeln!(out, "  - {name}").unwrap();
        }
    }

    out.push('\n');
    heavy_rule(&mut out);
    out.push_str("SECTION 2: FILES IN REFERENCE BUT NOT IN PROVIDED LIST\n");
    heavy_rule(&mut out);
    writeln!(out, "\nTotal: {} files\n", diff.only_in_b.len()).unwrap();
    if diff.only_in_b.is_empty() {
        out.push_str("  (None)\n");
    } else {
        for name in &diff.only_in_b {
            writeln!(out, "  + {name}").unwrap();
        }
    }

    out.push('\n');
    heavy_rule(&mut out);
    out.push_str("SECTION 3: FILES IN BOTH LISTS (MATCHED)\n");
    heavy_rule(&mut out);
    writeln!(out, "\nTotal: {} files\n", diff.in_both.len()).unwrap();
    for name in diff.in_both.iter().take(20) {
        writeln!(out, "  = {name}").unwrap();
    }
    if diff.in_both.len() > 20 {
        writeln!(out, "  ... and {} more", diff.in_both.len() - 20).unwrap();
    }

    out.push('\n');
    heavy_rule(&mut out);
    out.push_str("SUMMARY\n");
    heavy_rule(&mut out);
    writeln!(out, "Files in provided list:                 {:4}", provided.len()).unwrap();
    writeln!(out, "Files in reference list:                {:4}", reference.len()).unwrap();
    writeln!(out, "  Matched (in both):                    {:4}", diff.in_both.len()).unwrap();
    writeln!(out, "  Only in provided list:                {:4}", diff.only_in_a.len()).unwrap();
    writeln!(out, "  Only in reference list:               {:4}", diff.only_in_b.len()).unwrap();
    writeln!(
        out,
        "\nMatch rate: {:.1}% of provided list",
        diff.in_both.len() as f64 / provided.len().max(1) as f64 * 100.0
    )
    .unwrap();
    writeln!(
        out,
        "Coverage: {:.1}% of reference list\n",
        diff.in_both.len() as f64 / reference.len().max(1) as f64 * 100.0
    )
    .unwrap();

    if !diff.only_in_a.is_empty() {
        heavy_rule(&mut out);
        out.push_str("ANALYSIS: MISSING FILES BY TYPE\n");
        heavy_rule(&mut out);
        out.push_str("\nMissing files grouped by extension:\n\n");
        for (ext, files) in diff.only_in_a_by_extension() {
            writeln!(out, "  .{ext} ({} files):", files.len()).unwrap();
            for file in files {
                writeln!(out, "    - {file}").unwrap();
            }
            out.push('\n');
        }
    }

    out
}

/// Markdown report over string-literal I/O occurrences
pub fn render_fio_report(occurrences: &[FioOccurrence]) -> String {
    let total_files: BTreeSet<&str> = occurrences.iter().map(|o| o.source.as_str()).collect();

    let mut by_operation: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_file: BTreeMap<&str, usize> = BTreeMap::new();
    for occurrence in occurrences {
        *by_operation.entry(occurrence.op.as_str()).or_default() += 1;
        *by_file.entry(occurrence.source.as_str()).or_default() += 1;
    }

    let mut out = String::new();
    out.push_str("# SWAT+ File I/O Operations Using String Literals\n\n");
    out.push_str("## Executive Summary\n\n");
    writeln!(out, "**Total Files with FIO String Literals:** {}", total_files.len()).unwrap();
    writeln!(out, "**Total FIO String Literal Occurrences:** {}\n", occurrences.len()).unwrap();

    out.push_str("## Summary by Operation Type\n\n");
    for (op, count) in &by_operation {
        writeln!(out, "**{}:** {count} occurrences", op.to_uppercase()).unwrap();
    }
    out.push('\n');

    out.push_str("## Summary by File\n\n");
    let mut file_counts: Vec<(&str, usize)> = by_file.into_iter().collect();
    file_counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (file, count) in file_counts {
        writeln!(out, "**{file}:** {count} occurrences").unwrap();
    }
    out.push('\n');

    out.push_str("## Detailed Findings\n\n");
    let mut current_file: Option<&str> = None;
    for occurrence in occurrences {
        if current_file != Some(occurrence.source.as_str()) {
            current_file = Some(occurrence.source.as_str());
            writeln!(out, "### {}\n", occurrence.source).unwrap();
        }
        writeln!(out, "**Line {}** ({}):", occurrence.line, occurrence.op.as_str()).unwrap();
        writeln!(out, "```fortran\n{}\n```", occurrence.statement).unwrap();
        writeln!(out, "String literal: `{}`\n", occurrence.literal).unwrap();
    }

    out
}

/// Markdown report of the read structures found after literal opens
pub fn render_read_structure_report(results: &[FileReadStructure]) -> String {
    let summary = summarize(results);

    let mut out = String::new();
    out.push_str("# File Read Structure Analysis Report\n\n");
    out.push_str(
        "This report analyzes the read structure of files opened with string literals.\n\n",
    );

    out.push_str("## Summary\n\n");
    writeln!(
        out,
        "- **Files analyzed with open statements:** {}",
        summary.files_with_opens
    )
    .unwrap();
    writeln!(
        out,
        "- **Total open statements with string literals:** {}\n",
        summary.total_opens
    )
    .unwrap();

    out.push_str("### Read Operation Types\n");
    writeln!(out, "- **Header reads:** {}", summary.header_reads).unwrap();
    writeln!(out, "- **Data reads:** {}", summary.data_reads).unwrap();
    writeln!(out, "- **Title/Skip lines:** {}\n", summary.title_skip_reads).unwrap();

    out.push_str("## Detailed Analysis\n\n");
    for file_result in results {
        writeln!(out, "### File: `{}`\n", file_result.file).unwrap();
        for open in &file_result.opens {
            writeln!(out, "**Filename:** `{}` (Unit: {})", open.filename, open.unit).unwrap();
            writeln!(out, "**Line {}:** `{}`\n", open.line, open.statement).unwrap();

            if open.reads.is_empty() {
                out.push_str(
                    "**Read Structure:** No read operations found (likely output file)\n\n",
                );
            } else {
                out.push_str("**Read Structure:**\n");
                for (i, read) in open.reads.iter().enumerate() {
                    writeln!(
                        out,
                        "{}. **Line {}** ({}, {}): `{}`",
                        i + 1,
                        read.line,
                        read.kind.as_str(),
                        read.format.as_str(),
                        read.statement
                    )
                    .unwrap();
                    if !read.variables.is_empty() {
                        writeln!(out, "   - Variables: {}", read.variables.join(", ")).unwrap();
                    }
                    if !read.data_types.is_empty() {
                        writeln!(out, "   - Data types: {}", read.data_types.join(", ")).unwrap();
                    }
                }
                out.push('\n');
            }
            out.push_str("---\n\n");
        }
    }

    out
}

/// Plain-text summary of read-structure patterns
pub fn render_read_structure_summary(results: &[FileReadStructure]) -> String {
    let summary = summarize(results);

    let mut out = String::new();
    out.push_str("File Read Structure Summary\n");
    out.push_str("==========================\n\n");
    writeln!(out, "Input files (with read operations): {}", summary.input_files).unwrap();
    writeln!(out, "Output files (no read operations): {}\n", summary.output_files).unwrap();

    out.push_str("Input File Patterns:\n");
    out.push_str("===================\n");
    writeln!(out, "Header reads: {}", summary.header_reads).unwrap();
    writeln!(out, "Title/skip reads: {}\n", summary.title_skip_reads).unwrap();

    out.push_str("Data types found:\n");
    let mut type_counts: Vec<(&String, &usize)> = summary.data_type_counts.iter().collect();
    type_counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (dtype, count) in type_counts {
        writeln!(out, "  {dtype}: {count}").unwrap();
    }

    out.push_str("\nTop input files by read operations:\n");
    let mut input_opens: Vec<(&str, &str, usize)> = results
        .iter()
        .flat_map(|file| {
            file.opens
                .iter()
                .filter(|open| !open.reads.is_empty())
                .map(|open| (open.filename.as_str(), file.file.as_str(), open.reads.len()))
        })
        .collect();
    input_opens.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(b.0)));
    for (i, (filename, file, reads)) in input_opens.iter().take(10).enumerate() {
        writeln!(out, "{:2}. {filename} ({file}) - {reads} reads", i + 1).unwrap();
    }

    out
}

/// Markdown I/O trace document for one input file
pub fn render_io_trace(trace: &IoTrace) -> String {
    let mut out = String::new();
    writeln!(out, "# I/O Trace Documentation: {}\n", trace.filename).unwrap();
    out.push_str(&"=".repeat(70));
    out.push('\n');

    out.push_str("## Filename Resolution\n");
    writeln!(out, "- Variable: `{}`", trace.variable).unwrap();
    writeln!(out, "- Derived Type: `{}`", trace.derived_type).unwrap();
    writeln!(out, "- Default Value: `{}`", trace.filename).unwrap();
    writeln!(out, "- Declared in: `{}`\n", trace.module_file).unwrap();

    if let Some(reader) = &trace.reader_file {
        out.push_str("## I/O Subroutine\n");
        writeln!(out, "- File: `{reader}`\n").unwrap();
    }

    out.push_str("## I/O Statements\n");
    if let Some(open) = &trace.open_statement {
        out.push_str("### Open Statement\n");
        writeln!(out, "```fortran\n{open}\n```").unwrap();
        if let Some(unit) = &trace.unit {
            writeln!(out, "- Unit: {unit}\n").unwrap();
        }
    }
    if !trace.read_statements.is_empty() {
        writeln!(
            out,
            "### Read Statements ({} total)",
            trace.read_statements.len()
        )
        .unwrap();
        for (i, statement) in trace.read_statements.iter().enumerate() {
            writeln!(out, "{}. ```fortran\n{statement}\n```", i + 1).unwrap();
        }
    }

    out.push_str("\n## Next Steps\n");
    out.push_str("To complete the documentation:\n");
    if let Some(reader) = &trace.reader_file {
        writeln!(out, "1. Manually analyze each read statement in `{reader}`").unwrap();
    }
    out.push_str("2. Extract variable names from the I/O list\n");
    out.push_str("3. Look up type definitions for derived types\n");
    out.push_str("4. Create PRIMARY DATA READ table with all components\n");
    out.push_str("5. Add line numbers, defaults, units, and descriptions\n");

    out
}

/// Template for the primary-data-read table of one input file
pub fn render_primary_table_template(filename: &str) -> String {
    let mut out = String::new();
    writeln!(out, "\n## PRIMARY DATA READ Table Template: {filename}\n").unwrap();
    out.push_str("| Line in File | Position | Local (Y/N) | Derived Type | Component | Type | Default | Units | Description | Source Line |\n");
    out.push_str("|--------------|----------|-------------|--------------|-----------|------|---------|-------|-------------|-------------|\n");
    out.push_str("| 3+ | 1 | Y | N/A | variable_name | type | default | units | description | src/file.f90:line |\n");
    out.push_str("| ... | ... | ... | ... | ... | ... | ... | ... | ... | ... |\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use swatlens_fortran::io_refs::{IoOp, RefLocation};

    fn location(op: IoOp) -> RefLocation {
        RefLocation {
            source: "hru_read.f90".to_string(),
            line: 10,
            procedure: "hru_read".to_string(),
            op,
        }
    }

    #[test]
    fn scan_report_lists_patterns_and_counts() {
        let mut index = IoRefIndex::default();
        index
            .files
            .insert("hru.con".to_string(), vec![location(IoOp::Open)]);
        index
            .variables
            .insert("in_sim".to_string(), vec![location(IoOp::Open)]);

        let provided = BTreeMap::from([("hru.con".to_string(), 20), ("time.sim".to_string(), 6)]);
        let report = render_scan_report(&index, &provided);

        assert!(report.contains("1. FILES FOUND IN CODE"));
        assert!(report.contains("Pattern: hru.con"));
        assert!(report.contains("hru_read.f90 :: hru_read() [line 10]"));
        assert!(report.contains("Variable: in_sim"));
        assert!(report.contains("  - time.sim"));
        assert!(report.contains("Files in provided list: 2"));
    }

    #[test]
    fn fio_report_groups_by_operation() {
        let occurrences = vec![
            FioOccurrence {
                source: "a.f90".to_string(),
                line: 3,
                statement: "open (107, file = \"x.con\")".to_string(),
                op: IoOp::Open,
                literal: "x.con".to_string(),
            },
            FioOccurrence {
                source: "a.f90".to_string(),
                line: 9,
                statement: "inquire (file = \"x.con\", exist = i_exist)".to_string(),
                op: IoOp::Inquire,
                literal: "x.con".to_string(),
            },
        ];

        let report = render_fio_report(&occurrences);
        assert!(report.contains("**Total FIO String Literal Occurrences:** 2"));
        assert!(report.contains("**OPEN:** 1 occurrences"));
        assert!(report.contains("### a.f90"));
        assert!(report.contains("String literal: `x.con`"));
    }

    #[test]
    fn compare_report_has_all_sections() {
        let provided: BTreeSet<String> =
            ["hru.con", "extra.wro"].iter().map(|s| s.to_string()).collect();
        let reference: BTreeSet<String> =
            ["hru.con", "time.sim"].iter().map(|s| s.to_string()).collect();

        let report = render_compare_report(&provided, &reference);
        assert!(report.contains("SECTION 1"));
        assert!(report.contains("  - extra.wro"));
        assert!(report.contains("  + time.sim"));
        assert!(report.contains("  = hru.con"));
        assert!(report.contains(".wro (1 files)"));
    }

    #[test]
    fn primary_table_template_names_the_file() {
        let template = render_primary_table_template("aquifer.aqu");
        assert!(template.contains("PRIMARY DATA READ Table Template: aquifer.aqu"));
        assert!(template.contains("| Line in File |"));
    }
}
