use std::collections::BTreeMap;

use crate::alias::AliasTable;
use crate::model::{CellValue, Group, Row};
use crate::shape::ShapeKind;

/// First alias present in `row` with a non-blank value.
pub fn first_available<'r, S: AsRef<str>>(row: &'r Row, aliases: &[S]) -> Option<&'r CellValue> {
    aliases
        .iter()
        .filter_map(|alias| row.get(alias.as_ref()))
        .find(|value| !value.is_blank())
}

/// Build the data map for one shape of one row.
///
/// Keys are the normalized request keys of the shape's fields. A field with
/// no filled-in alias is left out; the service reports it.
pub fn extract(
    row: &Row,
    kind: ShapeKind,
    group: Group,
    aliases: &AliasTable,
) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    for token in kind.required_fields() {
        if let Some(value) = first_available(row, aliases.aliases(*token, group)) {
            data.insert(token.output_key(group).to_string(), value.to_text());
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earlier_alias_wins() {
        let row = Row::from_pairs([("P1", "9,9,9"), ("point_input", "1,2,3")]);
        let data = extract(&row, ShapeKind::Point, Group::Primary, AliasTable::builtin());
        assert_eq!(data["point_input"], "1,2,3");
    }

    #[test]
    fn blank_values_fall_through_to_next_alias() {
        let row = Row::from_pairs([
            ("circle_center", CellValue::Empty),
            ("c_center_A", CellValue::from("")),
            ("C1_center", CellValue::from("0,0")),
            ("C1_radius", CellValue::Number(2.0)),
        ]);
        let data = extract(&row, ShapeKind::Circle, Group::Primary, AliasTable::builtin());
        assert_eq!(data["circle_center"], "0,0");
        assert_eq!(data["circle_radius"], "2");
    }

    #[test]
    fn missing_fields_are_omitted() {
        let row = Row::from_pairs([("plane_a", "1"), ("plane_b", "")]);
        let data = extract(&row, ShapeKind::Plane, Group::Primary, AliasTable::builtin());
        assert_eq!(data.len(), 1);
        assert!(!data.contains_key("plane_b"));
    }

    #[test]
    fn secondary_line_uses_group_keys() {
        let row = Row::from_pairs([("d_P_data_B", "1,1,1"), ("P2_V", "0,0,1")]);
        let data = extract(&row, ShapeKind::Line, Group::Secondary, AliasTable::builtin());
        assert_eq!(data["line_A2"], "1,1,1");
        assert_eq!(data["line_X2"], "0,0,1");
    }
}
