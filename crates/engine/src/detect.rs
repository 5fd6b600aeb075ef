use crate::alias::AliasTable;
use crate::model::Group;
use crate::shape::ShapeKind;

/// Order in which shapes are tried. Plane comes first because its columns
/// are the most specific; Circle is tried before Sphere.
pub const DETECTION_ORDER: [ShapeKind; 5] = [
    ShapeKind::Plane,
    ShapeKind::Line,
    ShapeKind::Point,
    ShapeKind::Circle,
    ShapeKind::Sphere,
];

/// Infer the shape for `group` from the column names of a row sample.
///
/// A shape matches when every field it requires has at least one alias
/// among `columns`. The first match in [`DETECTION_ORDER`] wins; `None`
/// means detection failed and must not be read as a default shape.
pub fn detect_shape<S: AsRef<str>>(
    columns: &[S],
    group: Group,
    aliases: &AliasTable,
) -> Option<ShapeKind> {
    DETECTION_ORDER.into_iter().find(|kind| {
        kind.required_fields()
            .iter()
            .all(|token| aliases.is_resolvable(*token, group, columns))
    })
}
