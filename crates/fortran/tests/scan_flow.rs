use std::fs;
use swatlens_fortran::io_refs::IoOp;
use swatlens_fortran::{configurable_files, IoRefScanner, IoTraceGenerator};
use tempfile::tempdir;

fn write_tree(root: &std::path::Path) {
    fs::write(
        root.join("input_file_module.f90"),
        "      module input_file_module\n\
               type input_con\n\
                 character(len=25) :: hru = \"hru.con\"\n\
                 character(len=25) :: ru = \"rout_unit.con\"\n\
               end type input_con\n\
               type (input_con) :: in_con\n\
               end module input_file_module\n",
    )
    .unwrap();

    fs::write(
        root.join("hyd_read_connect.f90"),
        "      subroutine hyd_read_connect\n\
               open (107, file = in_con%hru)\n\
               read (107,*,iostat=eof) titldum\n\
               read (107,*,iostat=eof) ob(i)%num, ob(i)%name\n\
               close (107)\n\
               end subroutine hyd_read_connect\n",
    )
    .unwrap();

    let sub = root.join("output");
    fs::create_dir_all(&sub).unwrap();
    fs::write(
        sub.join("header_write.f90"),
        "      subroutine header_write\n\
               open (4000, file = \"basin_wb.txt\")\n\
               write (4000,*) \"channel.out\"\n\
               end subroutine header_write\n",
    )
    .unwrap();
}

#[test]
fn scan_covers_nested_directories() {
    let temp = tempdir().unwrap();
    write_tree(temp.path());

    let index = IoRefScanner::new(temp.path()).scan().unwrap();

    // literal open in a subdirectory
    let basin = &index.files["basin_wb.txt"];
    assert_eq!(basin.len(), 1);
    assert_eq!(basin[0].op, IoOp::Open);
    assert!(basin[0].source.contains("header_write.f90"));
    assert_eq!(basin[0].procedure, "header_write");

    // quoted extension literal inside a write statement
    assert_eq!(index.files["channel.out"][0].op, IoOp::Write);

    // variable-based open goes to the variable index
    assert!(index.variables.contains_key("in_con"));
}

#[test]
fn hardcoded_and_configurable_sets_intersect_correctly() {
    let temp = tempdir().unwrap();
    write_tree(temp.path());

    let configurable = configurable_files(&temp.path().join("input_file_module.f90")).unwrap();
    let hardcoded = IoRefScanner::new(temp.path()).scan_hardcoded().unwrap();

    assert!(configurable.contains("hru.con"));
    assert!(hardcoded.contains_key("basin_wb.txt"));
    assert!(!hardcoded.contains_key("hru.con"));
}

#[test]
fn trace_resolves_through_the_module() {
    let temp = tempdir().unwrap();
    write_tree(temp.path());

    let trace = IoTraceGenerator::new(temp.path()).generate("hru.con").unwrap();
    assert_eq!(trace.variable, "in_con%hru");
    assert_eq!(trace.reader_file.as_deref(), Some("hyd_read_connect.f90"));
    assert_eq!(trace.unit.as_deref(), Some("107"));
    assert_eq!(trace.read_statements.len(), 2);
}
