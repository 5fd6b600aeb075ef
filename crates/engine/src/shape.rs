//! Shape kinds, field tokens and the template registry.
//!
//! A shape template is the ordered list of field tokens a shape needs. The
//! registry is a `match`, so adding a shape kind fails to compile until every
//! template, label and output key covers it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::Group;

// ---------------------------------------------------------------------------
// Shape kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Point,
    Line,
    Plane,
    Circle,
    Sphere,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Point,
        ShapeKind::Line,
        ShapeKind::Plane,
        ShapeKind::Circle,
        ShapeKind::Sphere,
    ];

    /// Name the computation service uses for this shape.
    pub fn label(self) -> &'static str {
        match self {
            Self::Point => "Điểm",
            Self::Line => "Đường thẳng",
            Self::Plane => "Mặt phẳng",
            Self::Circle => "Đường tròn",
            Self::Sphere => "Mặt cầu",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Plane => "plane",
            Self::Circle => "circle",
            Self::Sphere => "sphere",
        }
    }

    /// Field tokens this shape requires, in template order.
    pub fn required_fields(self) -> &'static [FieldToken] {
        use FieldToken::*;
        match self {
            Self::Point => &[Point],
            Self::Line => &[LinePoint, LineVector],
            Self::Plane => &[PlaneA, PlaneB, PlaneC, PlaneD],
            Self::Circle => &[CircleCenter, CircleRadius],
            Self::Sphere => &[SphereCenter, SphereRadius],
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ShapeKind::ALL
            .into_iter()
            .find(|k| k.slug().eq_ignore_ascii_case(trimmed) || k.label() == trimmed)
            .ok_or_else(|| {
                format!(
                    "unknown shape '{trimmed}' (expected one of: point, line, plane, circle, sphere)"
                )
            })
    }
}

impl Serialize for ShapeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ShapeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Field tokens
// ---------------------------------------------------------------------------

/// Semantic input of a shape, independent of how a spreadsheet spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldToken {
    PlaneA,
    PlaneB,
    PlaneC,
    PlaneD,
    LinePoint,
    LineVector,
    Point,
    CircleCenter,
    CircleRadius,
    SphereCenter,
    SphereRadius,
}

impl FieldToken {
    pub const ALL: [FieldToken; 11] = [
        FieldToken::PlaneA,
        FieldToken::PlaneB,
        FieldToken::PlaneC,
        FieldToken::PlaneD,
        FieldToken::LinePoint,
        FieldToken::LineVector,
        FieldToken::Point,
        FieldToken::CircleCenter,
        FieldToken::CircleRadius,
        FieldToken::SphereCenter,
        FieldToken::SphereRadius,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::PlaneA => "plane_a",
            Self::PlaneB => "plane_b",
            Self::PlaneC => "plane_c",
            Self::PlaneD => "plane_d",
            Self::LinePoint => "line_point",
            Self::LineVector => "line_vec",
            Self::Point => "point",
            Self::CircleCenter => "circle_center",
            Self::CircleRadius => "circle_radius",
            Self::SphereCenter => "sphere_center",
            Self::SphereRadius => "sphere_radius",
        }
    }

    /// Key the extracted value is stored under in a calculation request.
    ///
    /// Line fields carry the group number (`line_A1` / `line_A2`); every
    /// other field uses the same key for both groups.
    pub fn output_key(self, group: Group) -> &'static str {
        match (self, group) {
            (Self::PlaneA, _) => "plane_a",
            (Self::PlaneB, _) => "plane_b",
            (Self::PlaneC, _) => "plane_c",
            (Self::PlaneD, _) => "plane_d",
            (Self::LinePoint, Group::Primary) => "line_A1",
            (Self::LinePoint, Group::Secondary) => "line_A2",
            (Self::LineVector, Group::Primary) => "line_X1",
            (Self::LineVector, Group::Secondary) => "line_X2",
            (Self::Point, _) => "point_input",
            (Self::CircleCenter, _) => "circle_center",
            (Self::CircleRadius, _) => "circle_radius",
            (Self::SphereCenter, _) => "sphere_center",
            (Self::SphereRadius, _) => "sphere_radius",
        }
    }
}

impl fmt::Display for FieldToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        FieldToken::ALL
            .into_iter()
            .find(|t| t.name() == trimmed)
            .ok_or_else(|| format!("unknown field token '{trimmed}'"))
    }
}
