use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EngineError;
use crate::shape::ShapeKind;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Empty cells and empty strings count as missing.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// String form used in requests and exports.
    ///
    /// Whole numbers print without a fractional part so `3.0` read from a
    /// spreadsheet reaches the service as `3`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

/// One input row: column name → value, in source column order.
///
/// Rows have no key of their own; they are identified by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        let mut row = Self::new();
        for (k, v) in pairs {
            row.set(k, v);
        }
        row
    }

    /// Set a column, replacing the value in place if the column exists.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Groups, selections, operations
// ---------------------------------------------------------------------------

/// Operand slot of a geometric operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    Primary,
    Secondary,
}

impl Group {
    /// Wire tag (`A` / `B`).
    pub fn tag(self) -> &'static str {
        match self {
            Self::Primary => "A",
            Self::Secondary => "B",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

impl Serialize for Group {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How the shape for one group is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeSelection {
    /// Infer from the column names of the first row.
    #[default]
    Auto,
    Shape(ShapeKind),
    /// No shape for this group.
    Absent,
}

impl FromStr for ShapeSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") || trimmed == "(Auto)" {
            return Ok(Self::Auto);
        }
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::Absent);
        }
        trimmed.parse().map(Self::Shape)
    }
}

impl fmt::Display for ShapeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Shape(kind) => write!(f, "{kind}"),
            Self::Absent => write!(f, "none"),
        }
    }
}

/// Geometric operation requested for every row of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    Intersection,
    Distance,
    Area,
    Volume,
    LineEquation,
    /// Operation known only to the service; treated as binary.
    Other(String),
}

impl Operation {
    pub const KNOWN: [Operation; 5] = [
        Operation::Intersection,
        Operation::Distance,
        Operation::Area,
        Operation::Volume,
        Operation::LineEquation,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::Intersection => "Tương giao",
            Self::Distance => "Khoảng cách",
            Self::Area => "Diện tích",
            Self::Volume => "Thể tích",
            Self::LineEquation => "PT đường thẳng",
            Self::Other(label) => label,
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            Self::Intersection => "intersection",
            Self::Distance => "distance",
            Self::Area => "area",
            Self::Volume => "volume",
            Self::LineEquation => "line-equation",
            Self::Other(label) => label,
        }
    }

    /// Unary operations take only the primary shape.
    pub fn is_unary(&self) -> bool {
        matches!(self, Self::Area | Self::Volume)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("operation must not be empty".to_string());
        }
        let known = Operation::KNOWN
            .into_iter()
            .find(|op| op.slug().eq_ignore_ascii_case(trimmed) || op.label() == trimmed);
        Ok(known.unwrap_or_else(|| Self::Other(trimmed.to_string())))
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Requests and results
// ---------------------------------------------------------------------------

/// One row's calculation, in the service's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub operation: Operation,
    #[serde(rename = "shape_A")]
    pub shape_primary: ShapeKind,
    #[serde(rename = "data_A")]
    pub data_primary: BTreeMap<String, String>,
    #[serde(rename = "shape_B", default, skip_serializing_if = "Option::is_none")]
    pub shape_secondary: Option<ShapeKind>,
    #[serde(rename = "data_B", default, skip_serializing_if = "Option::is_none")]
    pub data_secondary: Option<BTreeMap<String, String>>,
    /// Calculator version; the service picks its default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A computed result. Only `keylog` is interpreted; everything else the
/// service returns is kept as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(default)]
    pub keylog: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResultRecord {
    pub fn with_keylog(keylog: impl Into<String>) -> Self {
        Self {
            keylog: Some(keylog.into()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn keylog(&self) -> &str {
        self.keylog.as_deref().unwrap_or("")
    }
}

/// Per-row outcome.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultSlot {
    /// Not dispatched (batch cancelled before this row's chunk).
    #[default]
    Pending,
    Computed(ResultRecord),
    /// Remote failure, exhausted chunk, or null result.
    Failed,
}

impl ResultSlot {
    /// Computed with a non-empty keylog.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Computed(r) if !r.keylog().is_empty())
    }

    pub fn keylog(&self) -> &str {
        match self {
            Self::Computed(r) => r.keylog(),
            Self::Pending | Self::Failed => "",
        }
    }
}

/// Exactly one slot per input row, in input order. Slots are write-once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    slots: Vec<ResultSlot>,
}

impl ResultTable {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![ResultSlot::Pending; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResultSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[ResultSlot] {
        &self.slots
    }

    /// Write a slot. Fails if the index is out of range or already written.
    pub fn write(&mut self, index: usize, slot: ResultSlot) -> Result<(), EngineError> {
        let len = self.slots.len();
        let target = self
            .slots
            .get_mut(index)
            .ok_or(EngineError::SlotOutOfRange { index, len })?;
        if *target != ResultSlot::Pending {
            return Err(EngineError::SlotAlreadyWritten { index });
        }
        *target = slot;
        Ok(())
    }

    /// Keylog for a row, empty when the slot holds no result.
    pub fn keylog(&self, index: usize) -> &str {
        self.slots.get(index).map(ResultSlot::keylog).unwrap_or("")
    }

    pub fn succeeded(&self) -> usize {
        self.slots.iter().filter(|s| s.is_success()).count()
    }

    pub fn pending(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, ResultSlot::Pending))
            .count()
    }
}
