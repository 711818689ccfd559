use serde_json::Value;

use super::actions::FormCommand;
use crate::{
    error::PathError,
    path::{
        Path,
        access::{lookup, remove_item, try_set_path},
        parse,
    },
};

/// Produce the document that results from `command`. `document` is left untouched.
pub fn apply_command(document: &Value, command: FormCommand) -> Result<Value, PathError> {
    match command {
        FormCommand::SetField { path, value } => {
            let path = concrete(&path)?;
            try_set_path(document, &path, value)
        }
        FormCommand::AppendItem { path, item } => {
            let path = concrete(&path)?;
            let len = lookup(document, &path)
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            try_set_path(document, &path.child_index(len), item)
        }
        FormCommand::RemoveItem { path, index } => {
            concrete(&path)?;
            Ok(remove_item(document, &path, index))
        }
        FormCommand::Replace {
            document: next,
            changed_path,
        } => {
            if let Some(raw) = changed_path {
                ensure_resolvable(&next, &raw)?;
            }
            Ok(next)
        }
    }
}

fn concrete(raw: &str) -> Result<Path, PathError> {
    let path = parse(raw)?;
    if path.is_root() {
        return Err(PathError::Empty);
    }
    if !path.is_concrete() {
        return Err(PathError::PlaceholderInConcretePath);
    }
    Ok(path)
}

/// The changed leaf, or its parent when clearing it removed the key.
fn ensure_resolvable(document: &Value, raw: &str) -> Result<(), PathError> {
    let path = concrete(raw)?;
    let parent = path.parent().unwrap_or_default();
    if lookup(document, &path).is_some() || lookup(document, &parent).is_some() {
        Ok(())
    } else {
        Err(PathError::NotFound {
            path: raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn set_and_append_build_new_documents() {
        let doc = json!({"materialList": [{"country": "DE"}]});
        let next = apply_command(&doc, FormCommand::set("materialList[0].country", json!("FR"))).unwrap();
        assert_eq!(next, json!({"materialList": [{"country": "FR"}]}));

        let next = apply_command(
            &next,
            FormCommand::AppendItem {
                path: "materialList".into(),
                item: json!({"country": "IT"}),
            },
        )
        .unwrap();
        assert_eq!(next["materialList"][1]["country"], json!("IT"));
        assert_eq!(doc, json!({"materialList": [{"country": "DE"}]}));
    }

    #[test]
    fn rejects_template_and_root_paths() {
        let doc = json!({});
        assert_eq!(
            apply_command(&doc, FormCommand::set("list[item].x", json!(1))),
            Err(PathError::PlaceholderInConcretePath)
        );
        assert_eq!(apply_command(&doc, FormCommand::set("", json!(1))), Err(PathError::Empty));
        assert!(apply_command(&doc, FormCommand::set("a[", json!(1))).is_err());
    }

    #[test]
    fn replace_checks_the_changed_path() {
        let doc = json!({});
        let replaced = apply_command(
            &doc,
            FormCommand::Replace {
                document: json!({"a": {}}),
                changed_path: Some("a.x".into()),
            },
        );
        assert_eq!(replaced, Ok(json!({"a": {}})));

        let missing = apply_command(
            &doc,
            FormCommand::Replace {
                document: json!({"a": {}}),
                changed_path: Some("b.c.d".into()),
            },
        );
        assert_eq!(
            missing,
            Err(PathError::NotFound {
                path: "b.c.d".into()
            })
        );
    }

    #[test]
    fn remove_out_of_range_is_a_no_op() {
        let doc = json!({"list": [1, 2]});
        let next = apply_command(
            &doc,
            FormCommand::RemoveItem {
                path: "list".into(),
                index: 9,
            },
        )
        .unwrap();
        assert_eq!(next, doc);
    }
}
