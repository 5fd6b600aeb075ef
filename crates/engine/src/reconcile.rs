use crate::model::{CellValue, ResultTable, Row};

/// Column the computed keylog is written to unless configured otherwise.
pub const DEFAULT_OUTPUT_COLUMN: &str = "keylog";

/// An input row with the computed output column set.
pub type ExportRecord = Row;

/// Merge rows with their results by index.
///
/// Output order and length equal the input. Rows without a successful result
/// get an empty output value. If a row already has `output_column`, its value
/// is replaced in place; otherwise the column is appended.
pub fn reconcile(rows: &[Row], results: &ResultTable, output_column: &str) -> Vec<ExportRecord> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let mut record = row.clone();
            record.set(output_column, CellValue::Text(results.keylog(index).to_string()));
            record
        })
        .collect()
}

/// Header row for export: columns in first-seen order with the output
/// column last, unless an input row already carried it.
pub fn export_headers(records: &[ExportRecord], output_column: &str) -> Vec<String> {
    let input_has_output = records
        .iter()
        .any(|r| r.columns().take(r.len().saturating_sub(1)).any(|c| c == output_column));

    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for column in record.columns() {
            if column == output_column && !input_has_output {
                continue;
            }
            if !headers.iter().any(|h| h == column) {
                headers.push(column.to_string());
            }
        }
    }
    if !headers.iter().any(|h| h == output_column) {
        headers.push(output_column.to_string());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResultRecord, ResultSlot};
    use proptest::prelude::*;

    #[test]
    fn failed_and_pending_rows_get_empty_output() {
        let rows = vec![
            Row::from_pairs([("P1", "1")]),
            Row::from_pairs([("P1", "2")]),
            Row::from_pairs([("P1", "3")]),
        ];
        let mut table = ResultTable::new(3);
        table
            .write(0, ResultSlot::Computed(ResultRecord::with_keylog("k0")))
            .unwrap();
        table.write(1, ResultSlot::Failed).unwrap();

        let out = reconcile(&rows, &table, DEFAULT_OUTPUT_COLUMN);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].get("keylog"), Some(&CellValue::from("k0")));
        assert_eq!(out[1].get("keylog"), Some(&CellValue::from("")));
        assert_eq!(out[2].get("keylog"), Some(&CellValue::from("")));
        assert_eq!(out[0].get("P1"), Some(&CellValue::from("1")));
    }

    #[test]
    fn existing_output_column_is_replaced_in_place() {
        let rows = vec![Row::from_pairs([("keylog", "old"), ("P1", "1")])];
        let mut table = ResultTable::new(1);
        table
            .write(0, ResultSlot::Computed(ResultRecord::with_keylog("new")))
            .unwrap();
        let out = reconcile(&rows, &table, "keylog");
        let cols: Vec<&str> = out[0].columns().collect();
        assert_eq!(cols, vec!["keylog", "P1"]);
        assert_eq!(export_headers(&out, "keylog"), vec!["keylog", "P1"]);
    }

    #[test]
    fn headers_are_union_with_output_last() {
        let rows = vec![
            Row::from_pairs([("a", "1"), ("b", "2")]),
            Row::from_pairs([("c", "3"), ("a", "4")]),
        ];
        let out = reconcile(&rows, &ResultTable::new(2), "result");
        assert_eq!(export_headers(&out, "result"), vec!["a", "b", "c", "result"]);
    }

    fn slot_strategy() -> impl Strategy<Value = ResultSlot> {
        prop_oneof![
            Just(ResultSlot::Pending),
            Just(ResultSlot::Failed),
            "[a-z0-9]{0,6}".prop_map(|k| ResultSlot::Computed(ResultRecord::with_keylog(k))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: std::env::var("PROPTEST_CASES").ok().and_then(|s| s.parse().ok()).unwrap_or(256),
            failure_persistence: None,
            ..ProptestConfig::default()
        })]

        #[test]
        fn output_length_and_order_match_input(slots in proptest::collection::vec(slot_strategy(), 0..60)) {
            let rows: Vec<Row> = (0..slots.len())
                .map(|i| Row::from_pairs([("id", i as i64)]))
                .collect();
            let mut table = ResultTable::new(slots.len());
            for (i, slot) in slots.iter().enumerate() {
                if *slot != ResultSlot::Pending {
                    table.write(i, slot.clone()).unwrap();
                }
            }
            let out = reconcile(&rows, &table, "keylog");
            prop_assert_eq!(out.len(), rows.len());
            for (i, record) in out.iter().enumerate() {
                prop_assert_eq!(record.get("id"), Some(&CellValue::from(i as i64)));
                prop_assert_eq!(
                    record.get("keylog"),
                    Some(&CellValue::from(slots[i].keylog()))
                );
            }
        }
    }
}
