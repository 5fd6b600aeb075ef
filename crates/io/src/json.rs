// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use keybatch_engine::{CellValue, ExportRecord};
use serde_json::{Map, Value};

/// Export records as a JSON array of objects, keys in header order.
/// Blank cells are written as empty strings.
pub fn export(records: &[ExportRecord], headers: &[String], path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let writer = BufWriter::new(file);

    let rows: Vec<Value> = records
        .iter()
        .map(|record| {
            let mut obj = Map::new();
            for header in headers {
                obj.insert(header.clone(), json_value(record.get(header)));
            }
            Value::Object(obj)
        })
        .collect();

    serde_json::to_writer_pretty(writer, &rows).map_err(|e| e.to_string())?;
    Ok(())
}

fn json_value(cell: Option<&CellValue>) -> Value {
    match cell {
        Some(CellValue::Number(n)) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string())),
        Some(CellValue::Text(s)) => Value::String(s.clone()),
        Some(CellValue::Empty) | None => Value::String(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybatch_engine::Row;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");

        let records = vec![Row::from_pairs([
            ("P1", CellValue::from("1,2,3")),
            ("weight", CellValue::Number(1.5)),
            ("keylog", CellValue::Empty),
        ])];
        let headers: Vec<String> = vec!["P1".into(), "weight".into(), "keylog".into()];
        export(&records, &headers, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["P1"], "1,2,3");
        assert_eq!(parsed[0]["weight"], 1.5);
        assert_eq!(parsed[0]["keylog"], "");

        // key order follows headers
        let keys: Vec<&String> = parsed[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["P1", "weight", "keylog"]);
    }
}
