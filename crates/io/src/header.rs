// Header row normalization shared by the CSV and spreadsheet readers

use keybatch_engine::{CellValue, Row};

/// Turn raw header cells into unique column names.
///
/// Names are trimmed. Blank headers become `__EMPTY`, `__EMPTY_1`, …, and a
/// repeated name gets a `_1`, `_2`, … suffix, so no cell is dropped.
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = Vec::new();
    for cell in raw {
        let base = match cell.as_ref().trim() {
            "" => "__EMPTY".to_string(),
            name => name.to_string(),
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while names.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        names.push(candidate);
    }
    names
}

/// Build a row with one cell per header. Missing trailing cells are empty.
/// Returns `None` when every cell is blank.
pub fn build_row(headers: &[String], cells: Vec<CellValue>) -> Option<Row> {
    if cells.iter().all(CellValue::is_blank) {
        return None;
    }
    let mut cells = cells.into_iter();
    Some(Row::from_pairs(
        headers
            .iter()
            .map(|h| (h.clone(), cells.next().unwrap_or_default())),
    ))
}
