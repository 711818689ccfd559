//! Fallback `createDefault(seed?)` for schemas that do not ship their own factory.

use serde_json::{Map, Value};
use tracing::warn;

use super::flatten;
use crate::{
    domain::{FieldDefinition, FieldType},
    path::{
        access::{lookup, set_in_place},
        parse,
    },
};

/// Initial document for a creation session.
///
/// Top-level simple fields are present (their `default`, or the empty value) so a flat preview
/// shows them; nested simple fields only appear when they declare a `default`; objects are
/// created; arrays start empty. `seed` is deep-merged over the result.
pub fn default_document(definitions: &[FieldDefinition], seed: Option<&Value>) -> Value {
    let mut document = Value::Object(Map::new());
    let fields = match flatten(definitions) {
        Ok(fields) => fields,
        Err(err) => {
            warn!(%err, "cannot derive defaults from an invalid field list");
            return seed.cloned().unwrap_or(document);
        }
    };

    for (key, definition) in &fields {
        let Ok(path) = parse(key) else {
            continue;
        };
        // fields inside array items have no concrete location until an item exists
        if !path.is_concrete() || path.is_root() {
            continue;
        }
        let value = match (definition.field_type, &definition.default) {
            (_, Some(default)) => default.clone(),
            (FieldType::Object, None) => {
                if lookup(&document, &path).is_some_and(Value::is_object) {
                    continue;
                }
                Value::Object(Map::new())
            }
            (FieldType::Array, None) => Value::Array(Vec::new()),
            (field_type, None) if path.len() == 1 => empty_for(field_type),
            _ => continue,
        };
        if let Err(err) = set_in_place(&mut document, &path, value) {
            warn!(field = key.as_str(), %err, "skipping default");
        }
    }

    if let Some(seed) = seed {
        overlay(&mut document, seed);
    }
    document
}

fn empty_for(field_type: FieldType) -> Value {
    match field_type {
        FieldType::Checkbox => Value::Bool(false),
        _ => Value::String(String::new()),
    }
}

fn overlay(target: &mut Value, seed: &Value) {
    match (target, seed) {
        (Value::Object(target), Value::Object(seed)) => {
            for (key, value) in seed {
                match target.get_mut(key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, seed) => *target = seed.clone(),
    }
}
