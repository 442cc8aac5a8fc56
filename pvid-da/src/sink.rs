//! Report output

use crate::report::AnalyzeResult;
use pvid_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Directory under the input directory that receives reports
pub const RESULT_DIR: &str = "result";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(Error::Config(format!(
                "Unknown report format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Destination for finished reports
pub trait ReportSink {
    fn write_report(&self, result: &AnalyzeResult) -> Result<()>;
}

/// Writes one file per batch into `<input_dir>/result/`
#[derive(Debug, Clone)]
pub struct FileReportSink {
    dir: PathBuf,
    format: ReportFormat,
}

impl FileReportSink {
    pub fn new(input_dir: &Path, format: ReportFormat) -> Self {
        Self {
            dir: input_dir.join(RESULT_DIR),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output path for a batch name
    pub fn report_path(&self, name: &str) -> PathBuf {
        match self.format {
            ReportFormat::Text => self.dir.join(name),
            ReportFormat::Json => self.dir.join(format!("{}.json", name)),
        }
    }
}

impl ReportSink for FileReportSink {
    fn write_report(&self, result: &AnalyzeResult) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let body = match self.format {
            ReportFormat::Text => result.to_text(),
            ReportFormat::Json => result
                .to_json()
                .map_err(|e| Error::Internal(format!("Failed to serialize report: {}", e)))?,
        };
        let path = self.report_path(&result.name);
        fs::write(&path, body)?;
        info!("Report written: {}", path.display());
        Ok(())
    }
}
