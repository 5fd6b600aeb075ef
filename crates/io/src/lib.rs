// File I/O: rows in, results out

use std::path::Path;

use keybatch_engine::{ExportRecord, Row};

pub mod csv;
pub mod header;
pub mod json;
pub mod xlsx;

/// File name used when no output path is given.
pub const DEFAULT_EXPORT_FILE: &str = "geometry_results.xlsx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Json,
    /// Any spreadsheet calamine can read (xlsx, xlsm, xls, xlsb, ods).
    /// Written as xlsx.
    Xlsx,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("csv") | Some("txt") => Ok(FileFormat::Csv),
            Some("tsv") | Some("tab") => Ok(FileFormat::Tsv),
            Some("json") => Ok(FileFormat::Json),
            Some("xlsx") | Some("xlsm") | Some("xls") | Some("xlsb") | Some("ods") => {
                Ok(FileFormat::Xlsx)
            }
            _ => Err(format!(
                "cannot infer format from extension {:?}",
                ext.as_deref().unwrap_or("(none)")
            )),
        }
    }
}

/// Read every data row of a file. The first row is the header; every header
/// appears in every row, blank cells included.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, String> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => csv::import(path),
        FileFormat::Tsv => csv::import_tsv(path),
        FileFormat::Xlsx => xlsx::import(path),
        FileFormat::Json => Err("JSON input is not supported; use CSV or a spreadsheet".to_string()),
    }
}

/// Write export records in the format implied by the extension.
/// `sheet_name` only applies to xlsx.
pub fn write_records(
    path: &Path,
    records: &[ExportRecord],
    headers: &[String],
    sheet_name: &str,
) -> Result<(), String> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => csv::export(records, headers, path),
        FileFormat::Tsv => csv::export_tsv(records, headers, path),
        FileFormat::Json => json::export(records, headers, path),
        FileFormat::Xlsx => xlsx::export(records, headers, path, sheet_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.CSV")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("a.ods")).unwrap(), FileFormat::Xlsx);
        assert_eq!(FileFormat::from_path(Path::new("a.tsv")).unwrap(), FileFormat::Tsv);
        assert!(FileFormat::from_path(Path::new("a.pdf")).is_err());
        assert!(FileFormat::from_path(Path::new("noext")).is_err());
    }
}
