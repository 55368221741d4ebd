use once_cell::sync::Lazy;
use regex::Regex;

static TIME_SERIES_WITH_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(day|mon|yr|aa)\.(txt|csv)$").expect("valid regex"));
static TIME_SERIES_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(day|mon|yr|aa)$").expect("valid regex"));
static TEXT_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(txt|csv)$").expect("valid regex"));

/// Collapse time-series and format variants of one logical file to a single
/// wildcard pattern, so `hru_day.txt`, `hru_mon.csv` and `hru_aa` all group
/// under `hru.*`.
pub fn normalize_filename(filename: &str) -> String {
    let base = filename
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_lowercase();

    let base = TIME_SERIES_WITH_EXT.replace(&base, ".*");
    let base = TIME_SERIES_SUFFIX.replace(&base, ".*");
    let base = TEXT_EXTENSION.replace(&base, ".*");

    base.into_owned()
}

#[cfg(test)]
mod tests {
    use super::normalize_filename;
    use pretty_assertions::assert_eq;

    #[test]
    fn collapses_time_series_variants() {
        assert_eq!(normalize_filename("HRU_DAY.TXT"), "hru.*");
        assert_eq!(normalize_filename("hru_mon.csv"), "hru.*");
        assert_eq!(
            normalize_filename("HRU_DAY.TXT"),
            normalize_filename("hru_mon.csv")
        );
    }

    #[test]
    fn collapses_bare_suffix_and_extension() {
        assert_eq!(normalize_filename("channel_aa"), "channel.*");
        assert_eq!(normalize_filename("basin_wb.txt"), "basin_wb.*");
    }

    #[test]
    fn leaves_plain_input_names_alone() {
        assert_eq!(normalize_filename("hru.con"), "hru.con");
        assert_eq!(normalize_filename("  \"time.sim\" "), "time.sim");
    }
}
