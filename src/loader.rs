use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::models::Report;

pub const REPORT_ENV: &str = "ATTENDANCE_REPORT";

/// The `--report` flag if given, otherwise the `ATTENDANCE_REPORT` environment variable.
pub fn report_path(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match flag {
        Some(path) => Ok(path),
        None => std::env::var(REPORT_ENV)
            .map(PathBuf::from)
            .with_context(|| format!("pass --report or set {REPORT_ENV} to a report JSON file")),
    }
}

pub fn load_report(path: &Path) -> anyhow::Result<Report> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open report {}", path.display()))?;
    let report = read_report(file)
        .with_context(|| format!("failed to parse report {}", path.display()))?;

    info!(
        path = %path.display(),
        students = report.student_lookup.len(),
        modules = report.module_heatmap.len(),
        weeks = report.weeks.len(),
        "Loaded report"
    );
    Ok(report)
}

pub fn read_report<R: Read>(reader: R) -> anyhow::Result<Report> {
    let report: Report = serde_json::from_reader(std::io::BufReader::new(reader))?;
    debug!(student_enabled = report.student_enabled, "Parsed report");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn loads_report_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"weeks": ["Week 1"], "by_module": {{"CS101": 4}}, "student_enabled": true}}"#
        )
        .unwrap();

        let report = load_report(&path).unwrap();
        assert_eq!(report.weeks, vec!["Week 1"]);
        assert_eq!(report.by_module["CS101"], 4);
        assert!(report.student_enabled);
    }

    #[test]
    fn empty_object_is_an_empty_report() {
        let report = read_report("{}".as_bytes()).unwrap();
        assert!(report.weeks.is_empty());
        assert!(report.module_heatmap.is_empty());
        assert!(!report.student_enabled);
    }

    #[test]
    fn malformed_json_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_report(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_report(&tmp.path().join("absent.json")).is_err());
    }

    #[test]
    fn explicit_flag_wins() {
        let path = report_path(Some(PathBuf::from("given.json"))).unwrap();
        assert_eq!(path, PathBuf::from("given.json"));
    }
}
