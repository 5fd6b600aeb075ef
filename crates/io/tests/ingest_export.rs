//! Reading rows and writing results through the extension-dispatching API.

use std::fs;

use keybatch_engine::reconcile::export_headers;
use keybatch_engine::{reconcile, CellValue, ResultRecord, ResultSlot, ResultTable};
use keybatch_io::{read_rows, write_records};
use tempfile::tempdir;

#[test]
fn csv_in_xlsx_out_keeps_rows_and_appends_keylog() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("points.csv");
    fs::write(
        &input,
        "data_A;data_B;note\n1,2,3;4,5,6;first\n0,0,0;;second\n",
    )
    .unwrap();

    let rows = read_rows(&input).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("data_B"), Some(&CellValue::Empty));

    let mut results = ResultTable::new(rows.len());
    results
        .write(0, ResultSlot::Computed(ResultRecord::with_keylog("qw1")))
        .unwrap();
    results.write(1, ResultSlot::Failed).unwrap();

    let records = reconcile(&rows, &results, "keylog");
    let headers = export_headers(&records, "keylog");
    let output = dir.path().join("geometry_results.xlsx");
    write_records(&output, &records, &headers, "Results").unwrap();

    let back = read_rows(&output).unwrap();
    assert_eq!(back.len(), 2);
    let cols: Vec<&str> = back[0].columns().collect();
    assert_eq!(cols, vec!["data_A", "data_B", "note", "keylog"]);
    assert_eq!(back[0].get("keylog"), Some(&CellValue::from("qw1")));
    assert_eq!(back[1].get("keylog"), Some(&CellValue::Empty));
    assert_eq!(back[1].get("note"), Some(&CellValue::from("second")));
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("rows.pdf");
    fs::write(&input, "x").unwrap();
    let err = read_rows(&input).unwrap_err();
    assert!(err.contains("cannot infer format"), "{err}");
}

#[test]
fn json_output_is_array_of_objects() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("rows.tsv");
    fs::write(&input, "circle_center\tcircle_radius\n0,0\t2\n").unwrap();

    let rows = read_rows(&input).unwrap();
    let records = reconcile(&rows, &ResultTable::new(rows.len()), "keylog");
    let headers = export_headers(&records, "keylog");
    let output = dir.path().join("out.json");
    write_records(&output, &records, &headers, "Results").unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([
            {"circle_center": "0,0", "circle_radius": "2", "keylog": ""}
        ])
    );
}
