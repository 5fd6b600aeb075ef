use crate::alias::AliasTable;
use crate::error::{EngineError, ValidationError};
use crate::model::{Group, Operation, Row, ShapeSelection};
use crate::shape::ShapeKind;
use crate::validate::{validate, ValidationReport};

/// Everything one batch submission needs: the operation, the shape selection
/// for each group, and the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchContext {
    pub operation: Operation,
    pub primary: ShapeSelection,
    pub secondary: ShapeSelection,
    pub rows: Vec<Row>,
}

impl BatchContext {
    pub fn new(operation: Operation, rows: Vec<Row>) -> Self {
        Self {
            operation,
            primary: ShapeSelection::Auto,
            secondary: ShapeSelection::Auto,
            rows,
        }
    }

    pub fn with_primary(mut self, selection: ShapeSelection) -> Self {
        self.primary = selection;
        self
    }

    pub fn with_secondary(mut self, selection: ShapeSelection) -> Self {
        self.secondary = selection;
        self
    }

    pub fn validate(&self, aliases: &AliasTable) -> ValidationReport {
        validate(
            &self.rows,
            &self.operation,
            &self.primary,
            &self.secondary,
            aliases,
        )
    }

    /// Validate and return the shapes to dispatch with.
    ///
    /// Fails closed: an invalid report, an unresolved primary shape, or an
    /// unresolved secondary shape for a binary operation all refuse the
    /// batch. The secondary is always `None` for unary operations.
    pub fn resolve_shapes(
        &self,
        aliases: &AliasTable,
    ) -> Result<(ShapeKind, Option<ShapeKind>), EngineError> {
        let report = self.validate(aliases);
        if !report.valid {
            if report.issues == [ValidationError::EmptyDataset] {
                return Err(EngineError::EmptyDataset);
            }
            return Err(EngineError::Validation(report));
        }

        let primary = report.effective.primary.ok_or(EngineError::DetectionFailure {
            group: Group::Primary,
        })?;

        if self.operation.is_unary() {
            return Ok((primary, None));
        }
        let secondary = report.effective.secondary.ok_or(EngineError::DetectionFailure {
            group: Group::Secondary,
        })?;
        Ok((primary, Some(secondary)))
    }
}
