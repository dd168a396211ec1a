//! Per-unit report output.
//!
//! The orchestrator hands each unit's final violation list to a
//! [`ReportSink`]; where and how it is persisted is the sink's business.

use std::io::Write;
use std::path::{Path, PathBuf};

use sigcheck_config::ReportFormat;
use sigcheck_signature::Violation;

use crate::error::CheckError;

/// Destination for a unit's violation report.
///
/// Sinks are shared by concurrently checked units and must only write
/// per-unit outputs.
pub trait ReportSink: Send + Sync {
    /// Persists the report for `unit` and returns where it was written.
    fn emit(&self, unit: &str, violations: &[Violation]) -> Result<PathBuf, CheckError>;
}

/// Writes `{reports_dir}/{unit}.{ext}` files.
#[derive(Debug, Clone)]
pub struct FileReportSink {
    reports_dir: PathBuf,
    format: ReportFormat,
}

impl FileReportSink {
    /// Creates a sink writing into `reports_dir` in `format`.
    pub fn new(reports_dir: &Path, format: ReportFormat) -> Self {
        Self {
            reports_dir: reports_dir.to_path_buf(),
            format,
        }
    }

    /// Returns the report path for `unit`.
    pub fn report_path(&self, unit: &str) -> PathBuf {
        self.reports_dir
            .join(format!("{unit}.{}", self.format.extension()))
    }
}

/// Renders violations in the text report format, one line each.
pub fn render_text(violations: &[Violation]) -> String {
    let mut out = String::new();
    for violation in violations {
        out.push_str(&violation.to_string());
        out.push('\n');
    }
    out
}

impl ReportSink for FileReportSink {
    fn emit(&self, unit: &str, violations: &[Violation]) -> Result<PathBuf, CheckError> {
        let path = self.report_path(unit);
        let io_err = |source| CheckError::Report {
            path: path.clone(),
            source,
        };

        let body = match self.format {
            ReportFormat::Text => render_text(violations),
            ReportFormat::Json => serde_json::to_string_pretty(violations)
                .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?,
        };

        std::fs::create_dir_all(&self.reports_dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.reports_dir).map_err(io_err)?;
        tmp.write_all(body.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(path)
    }
}
