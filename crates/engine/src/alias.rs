//! Column alias table.
//!
//! Spreadsheets in the wild spell the same input many ways (`plane_a`,
//! `P1_a`, …). For every field token and group the table holds an ordered
//! alias list; earlier entries are preferred when several are filled in.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::model::Group;
use crate::shape::FieldToken;

/// (token, primary aliases, secondary aliases)
const BUILTIN_ALIASES: &[(FieldToken, &[&str], &[&str])] = &[
    (FieldToken::PlaneA, &["plane_a", "P1_a"], &["plane_a", "P2_a"]),
    (FieldToken::PlaneB, &["plane_b", "P1_b"], &["plane_b", "P2_b"]),
    (FieldToken::PlaneC, &["plane_c", "P1_c"], &["plane_c", "P2_c"]),
    (FieldToken::PlaneD, &["plane_d", "P1_d"], &["plane_d", "P2_d"]),
    (
        FieldToken::LinePoint,
        &["line_A1", "d_P_data_A", "P1_P"],
        &["line_A2", "d_P_data_B", "P2_P"],
    ),
    (
        FieldToken::LineVector,
        &["line_X1", "d_V_data_A", "P1_V"],
        &["line_X2", "d_V_data_B", "P2_V"],
    ),
    (
        FieldToken::Point,
        &["point_input", "data_A", "P1"],
        &["point_input", "data_B", "P2"],
    ),
    (
        FieldToken::CircleCenter,
        &["circle_center", "c_center_A", "C1_center"],
        &["circle_center", "c_center_B", "C2_center"],
    ),
    (
        FieldToken::CircleRadius,
        &["circle_radius", "c_radius_A", "C1_radius"],
        &["circle_radius", "c_radius_B", "C2_radius"],
    ),
    (
        FieldToken::SphereCenter,
        &["sphere_center", "s_center_A", "S1_center"],
        &["sphere_center", "s_center_B", "S2_center"],
    ),
    (
        FieldToken::SphereRadius,
        &["sphere_radius", "s_radius_A", "S1_radius"],
        &["sphere_radius", "s_radius_B", "S2_radius"],
    ),
];

static BUILTIN: Lazy<AliasTable> = Lazy::new(AliasTable::with_builtin_aliases);

#[derive(Debug, Clone, PartialEq)]
pub struct AliasTable {
    lists: HashMap<(FieldToken, Group), Vec<String>>,
}

impl AliasTable {
    /// Shared built-in table.
    pub fn builtin() -> &'static AliasTable {
        &BUILTIN
    }

    /// Fresh copy of the built-in table, for callers that add aliases.
    pub fn with_builtin_aliases() -> Self {
        let mut lists = HashMap::new();
        for (token, primary, secondary) in BUILTIN_ALIASES {
            lists.insert(
                (*token, Group::Primary),
                primary.iter().map(|s| s.to_string()).collect(),
            );
            lists.insert(
                (*token, Group::Secondary),
                secondary.iter().map(|s| s.to_string()).collect(),
            );
        }
        Self { lists }
    }

    /// Ordered alias list for a token in a group.
    pub fn aliases(&self, token: FieldToken, group: Group) -> &[String] {
        self.lists
            .get(&(token, group))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append aliases after the existing ones. Duplicates are skipped, so an
    /// alias already in the list keeps its position.
    pub fn extend<I, S>(&mut self, token: FieldToken, group: Group, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = self.lists.entry((token, group)).or_default();
        for alias in aliases {
            let alias = alias.into();
            if !alias.is_empty() && !list.contains(&alias) {
                list.push(alias);
            }
        }
    }

    /// True if any alias of `token` for `group` is among `columns`.
    pub fn is_resolvable<S: AsRef<str>>(
        &self,
        token: FieldToken,
        group: Group,
        columns: &[S],
    ) -> bool {
        self.aliases(token, group)
            .iter()
            .any(|alias| columns.iter().any(|c| c.as_ref() == alias))
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::with_builtin_aliases()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_token_has_aliases_for_both_groups() {
        let table = AliasTable::builtin();
        for token in FieldToken::ALL {
            assert!(!table.aliases(token, Group::Primary).is_empty(), "{token} primary");
            assert!(!table.aliases(token, Group::Secondary).is_empty(), "{token} secondary");
        }
    }

    #[test]
    fn alias_order_is_preserved() {
        let table = AliasTable::builtin();
        assert_eq!(
            table.aliases(FieldToken::LinePoint, Group::Secondary),
            &["line_A2", "d_P_data_B", "P2_P"]
        );
    }

    #[test]
    fn extend_appends_without_duplicates() {
        let mut table = AliasTable::with_builtin_aliases();
        table.extend(FieldToken::CircleRadius, Group::Primary, ["R1", "circle_radius", ""]);
        assert_eq!(
            table.aliases(FieldToken::CircleRadius, Group::Primary),
            &["circle_radius", "c_radius_A", "C1_radius", "R1"]
        );
        // built-in table is untouched
        assert_eq!(AliasTable::builtin().aliases(FieldToken::CircleRadius, Group::Primary).len(), 3);
    }

    #[test]
    fn resolvable_checks_presence_only() {
        let table = AliasTable::builtin();
        assert!(table.is_resolvable(FieldToken::PlaneA, Group::Secondary, &["P2_a"]));
        assert!(!table.is_resolvable(FieldToken::PlaneA, Group::Secondary, &["P1_a"]));
    }
}
