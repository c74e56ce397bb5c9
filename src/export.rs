// Report export boundary: files, logs and (on wasm32) browser downloads
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TelemetryError};
use crate::reporter::ReportFormat;

const FILENAME_PREFIX: &str = "performance-report";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub filename: String,
    /// Content length in bytes
    pub size: usize,
    pub format: ReportFormat,
}

/// Side-effecting sink for rendered reports
pub trait ReportExporter {
    fn export_report(
        &mut self,
        content: &str,
        format: ReportFormat,
        filename: Option<&str>,
    ) -> Result<ExportSummary>;
}

/// `performance-report-YYYY-MM-DD.<ext>`
pub fn default_filename(format: ReportFormat, date: NaiveDate) -> String {
    format!(
        "{}-{}.{}",
        FILENAME_PREFIX,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Given filename, or the dated default when none is supplied.
pub fn resolve_filename(filename: Option<&str>, format: ReportFormat) -> String {
    match filename {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => default_filename(format, Utc::now().date_naive()),
    }
}

/// Writes reports into a directory
pub struct FileExporter {
    directory: PathBuf,
}

impl FileExporter {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        FileExporter {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Export into the user's download directory.
    pub fn in_download_dir() -> Result<Self> {
        dirs::download_dir()
            .map(Self::new)
            .ok_or(TelemetryError::CapabilityUnavailable("download directory"))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ReportExporter for FileExporter {
    fn export_report(
        &mut self,
        content: &str,
        format: ReportFormat,
        filename: Option<&str>,
    ) -> Result<ExportSummary> {
        let filename = resolve_filename(filename, format);
        if Path::new(&filename).components().count() != 1 {
            return Err(TelemetryError::ExportError {
                filename,
                reason: "filename must not contain path separators".to_string(),
            });
        }

        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(&filename);
        fs::write(&path, content)?;
        log::info!("Report exported to {}", path.display());

        Ok(ExportSummary {
            filename,
            size: content.len(),
            format,
        })
    }
}

/// Logs reports instead of writing them; used where no file capability exists.
#[derive(Debug, Default)]
pub struct LogExporter {
    exported: usize,
}

impl LogExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exported_count(&self) -> usize {
        self.exported
    }
}

impl ReportExporter for LogExporter {
    fn export_report(
        &mut self,
        content: &str,
        format: ReportFormat,
        filename: Option<&str>,
    ) -> Result<ExportSummary> {
        let filename = resolve_filename(filename, format);
        log::info!("Performance report {} ({}):\n{}", filename, format, content);
        self.exported += 1;

        Ok(ExportSummary {
            filename,
            size: content.len(),
            format,
        })
    }
}
