use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::summary_writer::SummaryWriterError;

/// Suffix marking environments whose scan failed in the dirty list.
pub const SCAN_ERROR_SUFFIX: &str = " [SCAN ERROR]";

/// One non-passing package in `conda_audit_detailed_<host>.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    #[serde(rename = "Environment Path")]
    pub environment_path: String,
    #[serde(rename = "Package Name")]
    pub package_name: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Violation Type")]
    pub violation_type: String,
}

/// Paths of the three audit report files for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReportPaths {
    pub detailed_csv: PathBuf,
    pub all_dirty: PathBuf,
    pub violations_only: PathBuf,
}

impl AuditReportPaths {
    pub fn new(dir: &Path, host: &str) -> Self {
        Self {
            detailed_csv: dir.join(format!("conda_audit_detailed_{host}.csv")),
            all_dirty: dir.join(format!("conda_audit_all_dirty_{host}.txt")),
            violations_only: dir.join(format!("conda_audit_violations_only_{host}.txt")),
        }
    }
}

/// Write the detailed CSV and both environment lists.
///
/// The lists are written sorted, one path per line.
pub fn write_audit_reports(
    paths: &AuditReportPaths,
    findings: &[AuditFinding],
    dirty: &[String],
    violations: &[String],
) -> Result<(), SummaryWriterError> {
    let csv_error = |source: csv::Error| SummaryWriterError::CsvFailed {
        path: paths.detailed_csv.clone(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&paths.detailed_csv)
        .map_err(csv_error)?;
    writer
        .write_record(["Environment Path", "Package Name", "Version", "Violation Type"])
        .map_err(csv_error)?;
    for finding in findings {
        writer.serialize(finding).map_err(csv_error)?;
    }
    writer.flush()?;

    write_sorted_lines(&paths.all_dirty, dirty)?;
    write_sorted_lines(&paths.violations_only, violations)?;
    Ok(())
}

fn write_sorted_lines(path: &Path, lines: &[String]) -> Result<(), SummaryWriterError> {
    let mut sorted = lines.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut content = sorted.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

/// Host name used in report file names.
pub fn host_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .or_else(|| {
            fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_report_paths() {
        let paths = AuditReportPaths::new(Path::new("/reports"), "node01");
        assert_eq!(
            paths.detailed_csv,
            PathBuf::from("/reports/conda_audit_detailed_node01.csv")
        );
        assert_eq!(
            paths.violations_only,
            PathBuf::from("/reports/conda_audit_violations_only_node01.txt")
        );
    }

    #[test]
    fn test_write_audit_reports() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditReportPaths::new(temp_dir.path(), "node01");
        let findings = vec![AuditFinding {
            environment_path: "/envs/b".to_string(),
            package_name: "numpy".to_string(),
            version: "1.24.0".to_string(),
            violation_type: "VIOLATION_ANACONDA_DEFAULT".to_string(),
        }];
        let dirty = vec![
            "/envs/b".to_string(),
            format!("/envs/a{SCAN_ERROR_SUFFIX}"),
        ];

        write_audit_reports(&paths, &findings, &dirty, &["/envs/b".to_string()]).unwrap();

        let csv = fs::read_to_string(&paths.detailed_csv).unwrap();
        assert_eq!(
            csv,
            "Environment Path,Package Name,Version,Violation Type\n/envs/b,numpy,1.24.0,VIOLATION_ANACONDA_DEFAULT\n"
        );
        assert_eq!(
            fs::read_to_string(&paths.all_dirty).unwrap(),
            "/envs/a [SCAN ERROR]\n/envs/b\n"
        );
        assert_eq!(fs::read_to_string(&paths.violations_only).unwrap(), "/envs/b\n");
    }

    #[test]
    fn test_host_name_is_never_empty() {
        assert!(!host_name().is_empty());
    }
}
