use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::domain::error::{AppError, Result};

/// A single exported cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    Text(String),
    Bool(bool),
    Blank,
}

/// Render one sheet with a bold header row into an `.xlsx` buffer.
pub fn write_workbook(sheet_name: &str, headers: &[&str], rows: &[Vec<SheetCell>]) -> Result<Vec<u8>> {
    build_workbook(sheet_name, headers, rows)
        .map_err(|e| AppError::Internal(format!("Failed to write spreadsheet: {}", e)))
}

fn build_workbook(
    sheet_name: &str,
    headers: &[&str],
    rows: &[Vec<SheetCell>],
) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                SheetCell::Text(text) => {
                    sheet.write_string(row_num, col as u16, text)?;
                }
                SheetCell::Bool(value) => {
                    sheet.write_boolean(row_num, col as u16, *value)?;
                }
                SheetCell::Blank => {}
            }
        }
    }

    sheet.autofit();
    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;

    #[test]
    fn test_written_workbook_reads_back() {
        let bytes = write_workbook(
            "tasks",
            &["title", "completed", "due_date"],
            &[vec![
                SheetCell::Text("Renew badges".to_string()),
                SheetCell::Bool(true),
                SheetCell::Blank,
            ]],
        )
        .unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["tasks".to_string()]);

        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("title".to_string())));
        assert_eq!(
            range.get_value((1, 0)),
            Some(&Data::String("Renew badges".to_string()))
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::Bool(true)));
    }
}
