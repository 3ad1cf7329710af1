// ============================================================
// CSV PARSER
// ============================================================
// Parse CSV sheets into raw import rows, with encoding and delimiter detection

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::error::{AppError, Result};
use crate::domain::import::RawRow;

/// CSV parser producing header-keyed raw rows
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse a CSV file with automatic encoding and delimiter detection
    pub fn parse_file(path: &Path) -> Result<Vec<RawRow>> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::UnreadableFile(format!("Failed to read file: {}", e)))?;
        Self::parse_bytes(&bytes)
    }

    /// Parse CSV bytes with automatic encoding and delimiter detection
    pub fn parse_bytes(bytes: &[u8]) -> Result<Vec<RawRow>> {
        let content = decode_text(bytes);
        let delimiter = Self::detect_delimiter(&content);
        Self::new().with_delimiter(delimiter).parse_content(&content)
    }

    /// Parse CSV content from string. The first record is the header row.
    pub fn parse_content(&self, content: &str) -> Result<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::UnreadableFile(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::UnreadableFile(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            if record.iter().all(|value| value.trim().is_empty()) {
                continue;
            }
            rows.push(Self::parse_row(&headers, &record));
        }

        Ok(rows)
    }

    fn parse_row(headers: &StringRecord, record: &StringRecord) -> RawRow {
        headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                (
                    header.to_string(),
                    record.get(idx).unwrap_or("").to_string(),
                )
            })
            .collect()
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// UTF-8 (BOM stripped) when valid, otherwise Windows-1256, the code page
/// Excel uses for Arabic CSV exports.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(content) => content.to_string(),
        Err(_) => {
            let (content, _, _) = encoding_rs::WINDOWS_1256.decode(bytes);
            content.into_owned()
        }
    }
}
