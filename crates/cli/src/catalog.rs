// operations: what the service (or this build) knows about

use keybatch_config::Settings;
use keybatch_engine::{Operation, ShapeKind};
use serde::Serialize;

use crate::{CliError, RemoteArgs};

#[derive(Serialize)]
struct Entry {
    name: String,
    label: String,
}

fn builtin_operations() -> Vec<Entry> {
    Operation::KNOWN
        .iter()
        .map(|op| Entry { name: op.slug().to_string(), label: op.label().to_string() })
        .collect()
}

fn builtin_shapes() -> Vec<Entry> {
    ShapeKind::ALL
        .iter()
        .map(|kind| Entry { name: kind.slug().to_string(), label: kind.label().to_string() })
        .collect()
}

/// Service labels arrive untranslated; name them by slug where we know them.
fn from_labels<F>(labels: Vec<String>, slug_of: F) -> Vec<Entry>
where
    F: Fn(&str) -> Option<String>,
{
    labels
        .into_iter()
        .map(|label| Entry { name: slug_of(&label).unwrap_or_else(|| label.clone()), label })
        .collect()
}

fn shape_slug(label: &str) -> Option<String> {
    label.parse::<ShapeKind>().ok().map(|k| k.slug().to_string())
}

fn operation_slug(label: &str) -> Option<String> {
    match label.parse::<Operation>() {
        Ok(Operation::Other(_)) | Err(_) => None,
        Ok(op) => Some(op.slug().to_string()),
    }
}

pub fn cmd_operations(
    settings: &Settings,
    shapes: bool,
    for_operation: Option<Operation>,
    builtin: bool,
    remote: RemoteArgs,
    json: bool,
) -> Result<(), CliError> {
    let entries = if builtin {
        if shapes || for_operation.is_some() {
            // Every built-in operation accepts every shape
            builtin_shapes()
        } else {
            builtin_operations()
        }
    } else {
        let client = remote.client(settings)?;
        match &for_operation {
            Some(op) => from_labels(
                client.shapes_for_operation(op.label()).map_err(CliError::client)?,
                shape_slug,
            ),
            None if shapes => {
                from_labels(client.list_shapes().map_err(CliError::client)?, shape_slug)
            }
            None => from_labels(
                client.list_operations().map_err(CliError::client)?,
                operation_slug,
            ),
        }
    };

    if json {
        let text =
            serde_json::to_string_pretty(&entries).map_err(|e| CliError::io(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    let width = entries.iter().map(|e| e.name.chars().count()).max().unwrap_or(0);
    for entry in &entries {
        if entry.name == entry.label {
            println!("{}", entry.name);
        } else {
            println!("{:<width$}  {}", entry.name, entry.label, width = width);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_labels_get_slugs() {
        let entries = from_labels(
            vec!["Điểm".to_string(), "Hình nón".to_string()],
            shape_slug,
        );
        assert_eq!(entries[0].name, "point");
        assert_eq!(entries[1].name, "Hình nón");

        let ops = from_labels(vec!["Khoảng cách".to_string(), "Góc".to_string()], operation_slug);
        assert_eq!(ops[0].name, "distance");
        assert_eq!(ops[1].name, "Góc");
    }

    #[test]
    fn builtin_lists_cover_known_sets() {
        assert_eq!(builtin_operations().len(), Operation::KNOWN.len());
        assert_eq!(builtin_shapes()[2].name, "plane");
    }
}
