// Spreadsheet import (xlsx, xls, xlsb, ods; first sheet only) and xlsx export

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use keybatch_engine::{CellValue, ExportRecord, Row};
use rust_xlsxwriter::Workbook as XlsxWorkbook;

use crate::header::{build_row, normalize_headers};

/// Import the first sheet. Its first row is the header.
pub fn import(path: &Path) -> Result<Vec<Row>, String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open spreadsheet: {}", e))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| "Spreadsheet contains no sheets".to_string())?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let mut sheet_rows = range.rows();
    let headers = match sheet_rows.next() {
        Some(header) => normalize_headers(header.iter().map(|cell| cell_value(cell).to_text())),
        None => return Ok(Vec::new()),
    };

    Ok(sheet_rows
        .filter_map(|cells| build_row(&headers, cells.iter().map(cell_value).collect()))
        .collect())
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        // Serial number, as Excel stores it
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Write records to a single-sheet xlsx file. Numbers stay numbers.
pub fn export(
    records: &[ExportRecord],
    headers: &[String],
    path: &Path,
    sheet_name: &str,
) -> Result<(), String> {
    let mut xlsx_workbook = XlsxWorkbook::new();
    let worksheet = xlsx_workbook
        .add_worksheet()
        .set_name(sheet_name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, header)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }

    for (idx, record) in records.iter().enumerate() {
        let row = (idx + 1) as u32;
        for (col, header) in headers.iter().enumerate() {
            let col = col as u16;
            match record.get(header) {
                Some(CellValue::Number(n)) => {
                    worksheet
                        .write_number(row, col, *n)
                        .map_err(|e| format!("Failed to write cell: {}", e))?;
                }
                Some(CellValue::Text(s)) if !s.is_empty() => {
                    worksheet
                        .write_string(row, col, s)
                        .map_err(|e| format!("Failed to write cell: {}", e))?;
                }
                _ => {}
            }
        }
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_then_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.xlsx");

        let records = vec![
            Row::from_pairs([
                ("C1_center", CellValue::from("0,0")),
                ("C1_radius", CellValue::Number(2.0)),
                ("keylog", CellValue::from("wj2")),
            ]),
            Row::from_pairs([
                ("C1_center", CellValue::from("1,1")),
                ("C1_radius", CellValue::Number(0.5)),
                ("keylog", CellValue::from("")),
            ]),
        ];
        let headers: Vec<String> = ["C1_center", "C1_radius", "keylog"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        export(&records, &headers, &path, "Results").unwrap();

        let rows = import(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("C1_radius"), Some(&CellValue::Number(2.0)));
        assert_eq!(rows[0].get("keylog"), Some(&CellValue::from("wj2")));
        // failed row: empty keylog comes back as an empty cell, column kept
        assert_eq!(rows[1].get("keylog"), Some(&CellValue::Empty));
        assert_eq!(rows[1].get("C1_radius").map(CellValue::to_text), Some("0.5".to_string()));
    }

    #[test]
    fn test_invalid_sheet_name_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.xlsx");
        let err = export(&[], &[], &path, "bad/name").unwrap_err();
        assert!(err.contains("bad/name"), "{err}");
    }

    #[test]
    fn test_missing_file() {
        let err = import(Path::new("/nonexistent/input.xlsx")).unwrap_err();
        assert!(err.starts_with("Failed to open spreadsheet"), "{err}");
    }
}
