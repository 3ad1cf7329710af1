use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::import::RawRow;
use crate::infrastructure::csv::CsvParser;

/// An uploaded or on-disk spreadsheet.
#[derive(Debug, Clone)]
pub enum SpreadsheetSource {
    Path(PathBuf),
    Bytes {
        data: Vec<u8>,
        /// Original file name, used only to recognize CSV uploads
        file_name: Option<String>,
    },
}

impl SpreadsheetSource {
    pub fn from_bytes(data: Vec<u8>, file_name: Option<String>) -> Self {
        SpreadsheetSource::Bytes { data, file_name }
    }

    fn extension(&self) -> Option<String> {
        let name = match self {
            SpreadsheetSource::Path(path) => path.to_str(),
            SpreadsheetSource::Bytes { file_name, .. } => file_name.as_deref(),
        }?;
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    fn is_csv(&self) -> bool {
        self.extension().as_deref() == Some("csv")
    }
}

/// Decodes the first sheet of a workbook (or a CSV file) into raw rows keyed
/// by the header row.
pub struct SpreadsheetReader;

impl SpreadsheetReader {
    pub fn read(source: SpreadsheetSource) -> Result<Vec<RawRow>> {
        let rows = if source.is_csv() {
            match &source {
                SpreadsheetSource::Path(path) => CsvParser::parse_file(path)?,
                SpreadsheetSource::Bytes { data, .. } => CsvParser::parse_bytes(data)?,
            }
        } else {
            match source {
                SpreadsheetSource::Path(path) => {
                    let mut workbook = open_workbook_auto(&path).map_err(|e| {
                        AppError::UnreadableFile(format!(
                            "Failed to open workbook {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    first_sheet_rows(&mut workbook)?
                }
                SpreadsheetSource::Bytes { data, .. } => {
                    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data)).map_err(|e| {
                        AppError::UnreadableFile(format!("Failed to open workbook: {}", e))
                    })?;
                    first_sheet_rows(&mut workbook)?
                }
            }
        };

        if rows.is_empty() {
            return Err(AppError::EmptyFile);
        }

        debug!(rows = rows.len(), "Spreadsheet decoded");
        Ok(rows)
    }
}

fn first_sheet_rows<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Vec<RawRow>> {
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::UnreadableFile("No worksheet found".to_string()))?
        .map_err(|e| AppError::UnreadableFile(format!("Failed to read worksheet: {}", e)))?;

    Ok(rows_from_range(&range))
}

fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();

    rows.map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|cell| !cell.trim().is_empty()))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header.clone(), cells.get(idx).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Date cells become their serial number so the coercer sees one format.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
    }
}
