//! Immutable reads and writes of a JSON document addressed by path.
//!
//! Writers borrow the current document and return a new one; the input is never touched, so a
//! caller holding the previous document keeps a valid snapshot (undo, diffing).

use serde_json::{Map, Value};
use tracing::warn;

use super::{Path, Segment, parse};
use crate::error::PathError;

/// What `get` yields for "no value yet": missing keys, out-of-range indices, malformed paths.
static EMPTY: Value = Value::String(String::new());

pub fn empty_value() -> &'static Value {
    &EMPTY
}

/// Values that a write treats as "clear this field": `""` and `null`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Strict lookup: `None` when any segment is missing or the shape does not match.
pub fn lookup<'a>(document: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.segments() {
        current = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key)?,
            (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

fn lookup_mut<'a>(document: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut current = document;
    for segment in path.segments() {
        current = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get_mut(key)?,
            (Segment::Index(index), Value::Array(items)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Lenient read: anything unresolvable reads as the empty string.
pub fn get<'a>(document: &'a Value, raw: &str) -> &'a Value {
    match parse(raw) {
        Ok(path) => get_path(document, &path),
        Err(err) => {
            warn!(path = raw, %err, "malformed path on read");
            &EMPTY
        }
    }
}

pub fn get_path<'a>(document: &'a Value, path: &Path) -> &'a Value {
    lookup(document, path).unwrap_or(&EMPTY)
}

/// Largest run of `null`s a write may insert to reach an index past the end of an array.
pub const MAX_ARRAY_PADDING: usize = 1024;

/// Write `value` at `raw` and return the new document.
///
/// Empty values delete the key from its parent object, except for single-segment paths whose
/// key is kept with the empty value. A malformed path, or one that runs through a value of
/// another kind, leaves the document unchanged.
pub fn set(document: &Value, raw: &str, value: Value) -> Value {
    match parse(raw).and_then(|path| try_set_path(document, &path, value)) {
        Ok(next) => next,
        Err(err) => {
            warn!(path = raw, %err, "dropping write");
            document.clone()
        }
    }
}

pub fn set_path(document: &Value, path: &Path, value: Value) -> Value {
    match try_set_path(document, path, value) {
        Ok(next) => next,
        Err(err) => {
            warn!(path = %path, %err, "dropping write");
            document.clone()
        }
    }
}

/// Checked variant of [`set_path`] for callers that want to report the rejection.
pub fn try_set_path(document: &Value, path: &Path, value: Value) -> Result<Value, PathError> {
    if path.is_root() {
        return Err(PathError::Empty);
    }
    if !path.is_concrete() {
        return Err(PathError::PlaceholderInConcretePath);
    }
    let mut next = document.clone();
    set_in_place(&mut next, path, value)?;
    Ok(next)
}

/// Mutating core of the writers, for builders that own a document under construction.
/// On error `document` is left as it was.
pub(crate) fn set_in_place(document: &mut Value, path: &Path, value: Value) -> Result<(), PathError> {
    if is_empty_value(&value)
        && path.len() > 1
        && let Some(Segment::Key(key)) = path.last()
    {
        return clear(document, path, key);
    }
    check_writable(document, path)?;
    write(document, path.segments(), value);
    Ok(())
}

/// Remove `key` from the object at `path`'s parent. Nothing to clear when the parent is absent.
fn clear(document: &mut Value, path: &Path, key: &str) -> Result<(), PathError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    match lookup_mut(document, &parent) {
        Some(Value::Object(map)) => {
            map.remove(key);
            Ok(())
        }
        None | Some(Value::Null) => Ok(()),
        Some(_) => Err(PathError::ShapeMismatch {
            path: parent.to_string(),
        }),
    }
}

/// Walk `path` without touching anything. Missing or `null` slots may become containers;
/// existing values of another kind and far out-of-range indices are refused.
fn check_writable(document: &Value, path: &Path) -> Result<(), PathError> {
    let mut current = Some(document).filter(|value| !value.is_null());
    for (depth, segment) in path.segments().iter().enumerate() {
        let at = || Path::from_segments(path.segments()[..depth].to_vec()).to_string();
        current = match (segment, current) {
            (Segment::Item, _) => return Err(PathError::PlaceholderInConcretePath),
            (Segment::Key(key), Some(Value::Object(map))) => map.get(key),
            (Segment::Key(_), None) => None,
            (Segment::Index(index), Some(Value::Array(items))) => {
                check_gap(*index, items.len(), at)?;
                items.get(*index)
            }
            (Segment::Index(index), None) => {
                check_gap(*index, 0, at)?;
                None
            }
            (_, Some(_)) => return Err(PathError::ShapeMismatch { path: at() }),
        }
        .filter(|value| !value.is_null());
    }
    Ok(())
}

fn check_gap(index: usize, len: usize, at: impl Fn() -> String) -> Result<(), PathError> {
    if index.saturating_sub(len) > MAX_ARRAY_PADDING {
        return Err(PathError::IndexOutOfRange {
            path: at(),
            index,
            len,
        });
    }
    Ok(())
}

/// Infallible once [`check_writable`] accepted the path.
fn write(node: &mut Value, segments: &[Segment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    match head {
        Segment::Key(key) => {
            if node.is_null() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(key.clone()).or_insert(Value::Null);
                write(child, rest, value);
            }
        }
        Segment::Index(index) => {
            if node.is_null() {
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                if let Some(needed) = index.checked_add(1)
                    && items.len() < needed
                {
                    items.resize(needed, Value::Null);
                }
                if let Some(child) = items.get_mut(*index) {
                    write(child, rest, value);
                }
            }
        }
        Segment::Item => {}
    }
}

/// Append `item` to the array at `raw` (creating it when absent).
pub fn append_item(document: &Value, raw: &str, item: Value) -> Value {
    let path = match parse(raw) {
        Ok(path) => path,
        Err(err) => {
            warn!(path = raw, %err, "dropping append to malformed path");
            return document.clone();
        }
    };
    let len = lookup(document, &path)
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    set_path(document, &path.child_index(len), item)
}

/// Remove element `index` of the array at `raw`; later elements shift down by one.
/// Out-of-range indices and non-array targets leave the document unchanged.
pub fn remove_item(document: &Value, raw: &str, index: usize) -> Value {
    let path = match parse(raw) {
        Ok(path) => path,
        Err(err) => {
            warn!(path = raw, %err, "dropping removal at malformed path");
            return document.clone();
        }
    };
    let mut next = document.clone();
    if let Some(Value::Array(items)) = lookup_mut(&mut next, &path)
        && index < items.len()
    {
        items.remove(index);
    }
    next
}
