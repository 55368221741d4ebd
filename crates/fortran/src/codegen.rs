use crate::error::{FortranError, Result};
use crate::scanner::read_source;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;

/// Generator spec for a SWAT+ table-read subroutine
#[derive(Debug, Clone, Deserialize)]
pub struct TableReaderSpec {
    /// Name of the subroutine to create
    pub subroutine_name: String,
    /// Module that contains the derived type (looked up as `<module>.f90`)
    pub module_name: String,
    /// Derived type to read from the module
    pub type_name: String,
    /// Custom column headers; when empty, the type's variables are used.
    /// When set, the order and count must match the type's variables.
    #[serde(default)]
    pub header_string: String,
    /// Module parameter holding the required column headers; when empty the
    /// header string is hard-coded in the generated subroutine
    #[serde(default)]
    pub required_cols_param: String,
    /// Header columns that are character strings in the derived type
    #[serde(default)]
    pub string_columns: Vec<String>,
    /// File variable of the table to read, e.g. `in_lum%cons_prac_lum`
    pub input_file_name: String,
    /// Name of the array to allocate
    pub allocation_name: String,
    /// Local name for the table reader instance
    pub reader_name: String,
    /// `db_mx` counter to assign; empty if not applicable
    #[serde(default)]
    pub db_max_name: String,
    /// Modules the generated subroutine will use
    pub use_modules: Vec<String>,
}

/// Field names of a derived type, read from its module source. Comments are
/// stripped; collection runs from the `type <name>` line to `end type`.
pub fn type_variables(module_file: &Path, type_name: &str) -> Result<Vec<String>> {
    if !module_file.exists() {
        return Err(FortranError::MissingModuleFile(module_file.to_path_buf()));
    }
    let content = read_source(module_file)?;

    let mut vars = Vec::new();
    let mut in_type = false;
    for raw in content.lines() {
        let line = raw.split('!').next().unwrap_or("").trim();
        if in_type {
            let lowered = line.to_lowercase();
            if lowered.contains("end type") || lowered.contains("endtype") {
                break;
            }
            if let Some((_, decl)) = line.split_once("::") {
                let var = decl.split('=').next().unwrap_or("").trim();
                if !var.is_empty() {
                    vars.push(var.to_string());
                }
            }
        } else if line.to_lowercase().contains("type") && line.contains(type_name) {
            in_type = true;
        }
    }

    if vars.is_empty() {
        return Err(FortranError::TypeNotFound {
            type_name: type_name.to_string(),
            module: module_file.display().to_string(),
        });
    }
    Ok(vars)
}

/// Render the read subroutine for a spec, resolving the derived type's
/// variables from `<module_name>.f90` under `src_dir`.
pub fn generate_reader(spec: &TableReaderSpec, src_dir: &Path) -> Result<String> {
    let module_file = src_dir.join(format!("{}.f90", spec.module_name));
    let type_vars = type_variables(&module_file, &spec.type_name)?;

    let header_cols: Vec<String> = if spec.header_string.trim().is_empty() {
        type_vars.clone()
    } else {
        spec.header_string
            .split_whitespace()
            .map(str::to_string)
            .collect()
    };

    if header_cols.len() != type_vars.len() {
        return Err(FortranError::InvalidReaderSpec(format!(
            "{} header columns but {} variables in type {}",
            header_cols.len(),
            type_vars.len(),
            spec.type_name
        )));
    }

    let mut out = String::new();
    let dtype = &spec.reader_name;
    let alloc = &spec.allocation_name;

    writeln!(out, "subroutine {}\n", spec.subroutine_name).unwrap();
    for module in &spec.use_modules {
        writeln!(out, "use {module}").unwrap();
    }
    out.push('\n');
    out.push_str("implicit none\n\n");
    out.push_str("integer :: eof = 0     ! end of file\n");
    out.push_str("integer :: imax = 0    ! number of elements to be allocated\n");
    out.push_str("integer :: i\n\n");
    writeln!(out, "type(table_reader) :: {dtype}").unwrap();
    writeln!(
        out,
        "call {dtype}%init(unit=107, file_name={}) \n",
        spec.input_file_name
    )
    .unwrap();
    writeln!(out, "if ({dtype}%file_exists .eqv. .false.) then").unwrap();
    writeln!(out, "  allocate ({alloc}(0:0))").unwrap();
    out.push_str("else\n");
    writeln!(
        out,
        "  imax = {dtype}%get_num_data_lines()  !get number of valid data lines"
    )
    .unwrap();
    writeln!(out, "  allocate ({alloc}(0:imax))\n").unwrap();
    out.push_str("  if (imax /= 0) then\n\n");
    out.push_str("    ! optional call to set minimum required columns\n");
    if spec.required_cols_param.is_empty() {
        writeln!(
            out,
            "    call {dtype}%min_req_cols(\"{}\")\n",
            header_cols.join(" ")
        )
        .unwrap();
    } else {
        writeln!(out, "    call {dtype}%min_req_cols({})\n", spec.required_cols_param).unwrap();
    }
    out.push_str("    ! get the column headers\n");
    writeln!(out, "    call {dtype}%get_header_columns(eof)\n").unwrap();
    out.push_str("    if (eof == 0) then   ! proceed if not at the end of the file.\n");
    out.push_str("      do\n");
    out.push_str("        ! get a row of data\n");
    writeln!(out, "        call {dtype}%get_row_fields(eof)").unwrap();
    out.push_str("        if (eof /= 0) exit  ! exit if at the end of the file.\n\n");
    writeln!(
        out,
        "        ! Assign data to {alloc} fields based on header column names"
    )
    .unwrap();
    writeln!(out, "        do i = 1, {dtype}%get_col_count()").unwrap();
    writeln!(out, "          select case ({dtype}%header_cols(i))").unwrap();
    for (col_name, var_name) in header_cols.iter().zip(&type_vars) {
        writeln!(out, "            case (\"{col_name}\")").unwrap();
        if spec.string_columns.contains(col_name) {
            writeln!(
                out,
                "              {alloc}({dtype}%get_row_idx())%{var_name} = trim({dtype}%row_field(i))"
            )
            .unwrap();
        } else {
            writeln!(
                out,
                "              read({dtype}%row_field(i), *) {alloc}({dtype}%get_row_idx())%{var_name}"
            )
            .unwrap();
        }
    }
    out.push_str("            case default\n");
    out.push_str("              ! Output warning for unknown column header\n");
    writeln!(out, "              call {dtype}%output_column_warning(i)").unwrap();
    out.push_str("          end select\n");
    out.push_str("        end do\n");
    out.push_str("      enddo\n");
    out.push_str("    endif\n");
    out.push_str("  endif\n");
    out.push_str("endif\n\n");
    if !spec.db_max_name.is_empty() {
        writeln!(out, "db_mx%{} = imax\n", spec.db_max_name).unwrap();
    }
    writeln!(out, "close({dtype}%unit)\n").unwrap();
    out.push_str("return \n");
    writeln!(out, "end subroutine {}", spec.subroutine_name).unwrap();

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MODULE: &str = "\
      module landuse_data_module
      type conservation_practice_table
        character(len=40) :: name = \"\"   !none  |name of conservation practice
        real :: pfac = 0.          !none  |usle p factor
        real :: sl_len_mx = 0.     !m     |maximum slope length
      end type conservation_practice_table
      end module landuse_data_module
";

    fn spec() -> TableReaderSpec {
        TableReaderSpec {
            subroutine_name: "cons_prac_read".to_string(),
            module_name: "landuse_data_module".to_string(),
            type_name: "conservation_practice_table".to_string(),
            header_string: "name PFAC sl_len_mx".to_string(),
            required_cols_param: String::new(),
            string_columns: vec!["name".to_string()],
            input_file_name: "in_lum%cons_prac_lum".to_string(),
            allocation_name: "cons_prac".to_string(),
            reader_name: "lu_tbl".to_string(),
            db_max_name: "cons_prac".to_string(),
            use_modules: vec![
                "input_file_module".to_string(),
                "maximum_data_module".to_string(),
                "landuse_data_module".to_string(),
                "utils".to_string(),
            ],
        }
    }

    #[test]
    fn generated_reader_has_case_arms_and_counter() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("landuse_data_module.f90"), MODULE).unwrap();

        let out = generate_reader(&spec(), temp.path()).unwrap();

        assert!(out.starts_with("subroutine cons_prac_read"));
        assert!(out.contains("allocate (cons_prac(0:imax))"));
        assert!(out.contains("case (\"PFAC\")"));
        assert!(out.contains("= trim(lu_tbl%row_field(i))"));
        assert!(out.contains("read(lu_tbl%row_field(i), *) cons_prac(lu_tbl%get_row_idx())%sl_len_mx"));
        assert!(out.contains("db_mx%cons_prac = imax"));
        assert!(out.ends_with("end subroutine cons_prac_read\n"));
    }

    #[test]
    fn counter_is_omitted_without_db_max_name() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("landuse_data_module.f90"), MODULE).unwrap();

        let mut spec = spec();
        spec.db_max_name = String::new();
        let out = generate_reader(&spec, temp.path()).unwrap();
        assert!(!out.contains("db_mx%"));
    }

    #[test]
    fn header_count_mismatch_is_rejected() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("landuse_data_module.f90"), MODULE).unwrap();

        let mut spec = spec();
        spec.header_string = "name pfac".to_string();
        let err = generate_reader(&spec, temp.path()).unwrap_err();
        assert!(matches!(err, FortranError::InvalidReaderSpec(_)));
    }
}
