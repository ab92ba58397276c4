//! Local file export.
//!
//! Writes a spreadsheet and a JSON document, replacing any previous files.
//! When the spreadsheet writer fails, the same rows go to a CSV file next to
//! the requested path so the run's data is never silently lost.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rust_xlsxwriter::{Format, Workbook};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Announcement, ExportConfig};
use crate::storage::AnnouncementSink;

/// UTF-8 byte order mark so spreadsheet apps detect Korean text in CSV.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sink writing `.xlsx` and/or `.json` files.
#[derive(Debug, Clone)]
pub struct FileExportSink {
    xlsx_path: Option<PathBuf>,
    json_path: Option<PathBuf>,
}

impl FileExportSink {
    pub fn new(xlsx_path: Option<PathBuf>, json_path: Option<PathBuf>) -> Self {
        Self {
            xlsx_path,
            json_path,
        }
    }

    pub fn from_config(export: &ExportConfig) -> Self {
        Self::new(
            Some(export.xlsx_path.clone()),
            Some(export.json_path.clone()),
        )
    }

    /// Write the spreadsheet, falling back to CSV at the sibling path.
    ///
    /// Returns the path actually written.
    pub fn write_table(path: &Path, records: &[Announcement]) -> Result<PathBuf> {
        match write_xlsx(path, records) {
            Ok(()) => Ok(path.to_path_buf()),
            Err(e) => {
                let csv_path = path.with_extension("csv");
                log::warn!(
                    "[export] spreadsheet write to {} failed: {}; writing {} instead",
                    path.display(),
                    e,
                    csv_path.display()
                );
                write_csv(&csv_path, records)?;
                Ok(csv_path)
            }
        }
    }
}

/// Create the parent directory of an output path if it is missing.
async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Run the blocking spreadsheet/CSV writers off the async runtime.
async fn export_table(path: PathBuf, records: Vec<Announcement>) -> Result<PathBuf> {
    ensure_parent(&path).await?;
    let context = path.display().to_string();
    tokio::task::spawn_blocking(move || FileExportSink::write_table(&path, &records))
        .await
        .map_err(|e| AppError::persistence(context, e))?
}

fn write_xlsx(path: &Path, records: &[Announcement]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("announcements")?;

    for (col, name) in Announcement::COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, value) in record.row().iter().enumerate() {
            worksheet.write_string(row, col as u16, *value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_csv(path: &Path, records: &[Announcement]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(Announcement::COLUMNS)?;
    for record in records {
        writer.write_record(record.row())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write JSON atomically (write to temp, then rename).
async fn write_json(path: &Path, records: &[Announcement]) -> Result<()> {
    ensure_parent(path).await?;
    let bytes = serde_json::to_vec_pretty(records)?;

    let tmp = path.with_extension("json.tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl AnnouncementSink for FileExportSink {
    fn name(&self) -> &str {
        "export"
    }

    async fn write(&self, records: &[Announcement]) -> Result<usize> {
        if records.is_empty() {
            log::warn!("[export] nothing to save");
            return Ok(0);
        }

        // Both outputs are attempted; the first failure is reported after.
        let mut failure = None;

        if let Some(path) = &self.xlsx_path {
            match export_table(path.clone(), records.to_vec()).await {
                Ok(written) => {
                    log::info!("[export] {} rows written to {}", records.len(), written.display())
                }
                Err(e) => {
                    log::error!("[export] table export to {} failed: {e}", path.display());
                    failure = failure.or(Some(e));
                }
            }
        }
        if let Some(path) = &self.json_path {
            match write_json(path, records).await {
                Ok(()) => {
                    log::info!("[export] {} records written to {}", records.len(), path.display())
                }
                Err(e) => {
                    log::error!("[export] JSON export to {} failed: {e}", path.display());
                    failure = failure.or(Some(e));
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(records.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::Source;

    fn records() -> Vec<Announcement> {
        vec![
            Announcement {
                source_id: "1".to_string(),
                title: "스마트공장 구축 지원".to_string(),
                application_end: Some("2025-07-01".to_string()),
                ..Announcement::new(Source::Smes)
            },
            Announcement {
                source_id: "2".to_string(),
                title: "수출바우처, 2차".to_string(),
                ..Announcement::new(Source::Smes)
            },
        ]
    }

    #[tokio::test]
    async fn test_writes_xlsx_and_json() {
        let tmp = TempDir::new().unwrap();
        let xlsx = tmp.path().join("out.xlsx");
        let json = tmp.path().join("out.json");
        let sink = FileExportSink::new(Some(xlsx.clone()), Some(json.clone()));

        assert_eq!(sink.write(&records()).await.unwrap(), 2);
        assert!(xlsx.exists());
        assert!(!tmp.path().join("out.csv").exists());

        let loaded: Vec<Announcement> =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(loaded, records());
    }

    #[tokio::test]
    async fn test_json_is_replaced_not_appended() {
        let tmp = TempDir::new().unwrap();
        let json = tmp.path().join("out.json");
        let sink = FileExportSink::new(None, Some(json.clone()));

        sink.write(&records()).await.unwrap();
        sink.write(&records()[..1]).await.unwrap();

        let loaded: Vec<Announcement> =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn test_spreadsheet_failure_falls_back_to_csv() {
        let tmp = TempDir::new().unwrap();
        let xlsx = tmp.path().join("out.xlsx");
        let mut rows = records();
        // Cells are capped at 32,767 characters.
        rows[0].content = "가".repeat(40_000);

        let sink = FileExportSink::new(Some(xlsx.clone()), None);
        assert_eq!(sink.write(&rows).await.unwrap(), 2);

        let csv_path = tmp.path().join("out.csv");
        let bytes = std::fs::read(&csv_path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert!(text.starts_with("source,source_id,title"));
        assert!(text.contains("\"수출바우처, 2차\""));
    }

    #[tokio::test]
    async fn test_missing_output_directory_is_created() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let sink = FileExportSink::new(Some(out.join("a.xlsx")), Some(out.join("a.json")));

        assert_eq!(sink.write(&records()).await.unwrap(), 2);
        assert!(out.join("a.xlsx").exists());
        assert!(out.join("a.json").exists());
    }

    #[tokio::test]
    async fn test_table_failure_still_writes_json() {
        let tmp = TempDir::new().unwrap();
        // A regular file where the table's directory should be.
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let json = tmp.path().join("out.json");
        let sink = FileExportSink::new(Some(blocker.join("a.xlsx")), Some(json.clone()));

        assert!(sink.write(&records()).await.is_err());

        let loaded: Vec<Announcement> =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_input_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let json = tmp.path().join("out.json");
        let sink = FileExportSink::new(None, Some(json.clone()));

        assert_eq!(sink.write(&[]).await.unwrap(), 0);
        assert!(!json.exists());
    }
}
