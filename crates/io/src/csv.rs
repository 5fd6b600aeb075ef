// CSV/TSV row import and record export

use std::io::Read;
use std::path::Path;

use keybatch_engine::{CellValue, ExportRecord, Row};

use crate::header::{build_row, normalize_headers};

pub fn import(path: &Path) -> Result<Vec<Row>, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Vec<Row>, String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, b'\t')
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    // Excel writes a BOM on "CSV UTF-8"
    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

fn import_from_string(content: &str, delimiter: u8) -> Result<Vec<Row>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers = match records.next() {
        Some(header) => normalize_headers(header.map_err(|e| e.to_string())?.iter()),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        let cells = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::from(field)
                }
            })
            .collect();
        if let Some(row) = build_row(&headers, cells) {
            rows.push(row);
        }
    }
    Ok(rows)
}

pub fn export(records: &[ExportRecord], headers: &[String], path: &Path) -> Result<(), String> {
    export_with_delimiter(records, headers, path, b',')
}

pub fn export_tsv(records: &[ExportRecord], headers: &[String], path: &Path) -> Result<(), String> {
    export_with_delimiter(records, headers, path, b'\t')
}

fn export_with_delimiter(
    records: &[ExportRecord],
    headers: &[String],
    path: &Path,
    delimiter: u8,
) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer.write_record(headers).map_err(|e| e.to_string())?;
    for record in records {
        let fields = headers
            .iter()
            .map(|h| record.get(h).map(CellValue::to_text).unwrap_or_default());
        writer.write_record(fields).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
