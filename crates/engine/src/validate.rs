//! Pre-flight structural validation.
//!
//! Only the first row is inspected: ingestion gives every row the same
//! columns, so its column set stands for the whole dataset. Values are not
//! checked, only the presence of at least one alias per required field.

use serde::Serialize;

use crate::alias::AliasTable;
use crate::detect::detect_shape;
use crate::error::ValidationError;
use crate::model::{Group, Operation, Row, ShapeSelection};
use crate::shape::ShapeKind;

/// Shapes the batch will actually use after `auto` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EffectiveShapes {
    pub primary: Option<ShapeKind>,
    pub secondary: Option<ShapeKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    /// Rendered form of `issues`, in the same order.
    pub errors: Vec<String>,
    #[serde(skip)]
    pub issues: Vec<ValidationError>,
    pub detected_columns: Vec<String>,
    pub effective: EffectiveShapes,
}

impl ValidationReport {
    fn from_issues(
        issues: Vec<ValidationError>,
        detected_columns: Vec<String>,
        effective: EffectiveShapes,
    ) -> Self {
        Self {
            valid: issues.is_empty(),
            errors: issues.iter().map(ToString::to_string).collect(),
            issues,
            detected_columns,
            effective,
        }
    }
}

/// Resolve one group's selection against the detected columns.
pub fn resolve_selection(
    selection: &ShapeSelection,
    columns: &[String],
    group: Group,
    aliases: &AliasTable,
) -> Option<ShapeKind> {
    match selection {
        ShapeSelection::Auto => detect_shape(columns, group, aliases),
        ShapeSelection::Shape(kind) => Some(*kind),
        ShapeSelection::Absent => None,
    }
}

/// Validate a row sample for an operation and a pair of shape selections.
///
/// A selection that resolves to no shape produces no error here; refusing
/// to dispatch on a failed detection is the caller's job (see
/// [`crate::context::BatchContext::resolve_shapes`]).
pub fn validate(
    rows: &[Row],
    operation: &Operation,
    primary: &ShapeSelection,
    secondary: &ShapeSelection,
    aliases: &AliasTable,
) -> ValidationReport {
    let Some(first) = rows.first() else {
        return ValidationReport::from_issues(
            vec![ValidationError::EmptyDataset],
            Vec::new(),
            EffectiveShapes::default(),
        );
    };

    let columns: Vec<String> = first.columns().map(str::to_string).collect();

    let effective = EffectiveShapes {
        primary: resolve_selection(primary, &columns, Group::Primary, aliases),
        secondary: if operation.is_unary() {
            None
        } else {
            resolve_selection(secondary, &columns, Group::Secondary, aliases)
        },
    };

    let mut issues = Vec::new();
    if let Some(kind) = effective.primary {
        collect_missing(kind, Group::Primary, &columns, aliases, &mut issues);
    }
    if let Some(kind) = effective.secondary {
        collect_missing(kind, Group::Secondary, &columns, aliases, &mut issues);
    }

    ValidationReport::from_issues(issues, columns, effective)
}

fn collect_missing(
    kind: ShapeKind,
    group: Group,
    columns: &[String],
    aliases: &AliasTable,
    issues: &mut Vec<ValidationError>,
) {
    for token in kind.required_fields() {
        if !aliases.is_resolvable(*token, group, columns) {
            issues.push(ValidationError::MissingColumn {
                shape: kind,
                group,
                aliases: aliases.aliases(*token, group).to_vec(),
            });
        }
    }
}
