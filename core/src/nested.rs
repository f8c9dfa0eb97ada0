//! Conversions between flat path maps and nested values.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::path::{FieldPath, Segment, MAX_INDEX};

/// Write `value` at `path` inside `target`, creating containers on the way.
///
/// Key segments create objects and index segments create arrays (padded with
/// `null`). A non-container found on the way is replaced. A digit-only key
/// addresses an existing array by position. A write that would pad an array
/// past [`MAX_INDEX`] is dropped.
pub fn insert_at(target: &mut Value, path: &FieldPath, value: Value) {
    let mut node = target;
    for segment in path.segments() {
        node = match child_mut(node, segment) {
            Some(child) => child,
            None => return,
        };
    }
    *node = value;
}

fn child_mut<'a>(node: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    let position = match segment {
        Segment::Index(index) => Some(*index),
        Segment::Key(_) if node.is_array() => segment.as_index(),
        Segment::Key(_) => None,
    };

    match position {
        Some(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            match node {
                Value::Array(items) => {
                    if items.len() <= index {
                        if index > MAX_INDEX {
                            return None;
                        }
                        items.resize(index + 1, Value::Null);
                    }
                    items.get_mut(index)
                }
                _ => None,
            }
        }
        None => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            match node {
                Value::Object(map) => Some(map.entry(segment.to_string()).or_insert(Value::Null)),
                _ => None,
            }
        }
    }
}

/// Read the value at `path`, if present.
pub fn get_at<'a>(value: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut node = value;
    for segment in path.segments() {
        node = match (node, segment) {
            (Value::Array(items), _) => items.get(segment.as_index()?)?,
            (Value::Object(map), Segment::Key(key)) => map.get(key)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Build a nested value from `(path, value)` pairs, starting from an object.
pub fn build<'a, I>(entries: I) -> Value
where
    I: IntoIterator<Item = (&'a FieldPath, Value)>,
{
    let mut root = Value::Object(Map::new());
    for (path, value) in entries {
        insert_at(&mut root, path, value);
    }
    root
}

/// Result of flattening a nested value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flattened {
    /// Leaf path to value, in traversal order.
    pub leaves: IndexMap<FieldPath, Value>,
    /// Scalars that were reached without matching the leaf predicate.
    pub unmatched: Vec<FieldPath>,
}

/// Walk `value` and collect every node accepted by `is_leaf`.
///
/// Objects and arrays that are not leaves are descended into; `null` is
/// skipped; any other non-leaf scalar lands in [`Flattened::unmatched`].
pub fn flatten<F>(value: &Value, is_leaf: F) -> Flattened
where
    F: Fn(&FieldPath, &Value) -> bool,
{
    let mut out = Flattened::default();
    traverse(&FieldPath::root(), value, &is_leaf, &mut out);
    out
}

fn traverse<F>(path: &FieldPath, node: &Value, is_leaf: &F, out: &mut Flattened)
where
    F: Fn(&FieldPath, &Value) -> bool,
{
    if !path.is_empty() && is_leaf(path, node) {
        out.leaves.insert(path.clone(), node.clone());
        return;
    }
    match node {
        Value::Null => {}
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                traverse(&path.child(index), item, is_leaf, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                traverse(&path.child(Segment::key(key.as_str())), item, is_leaf, out);
            }
        }
        _ => out.unmatched.push(path.clone()),
    }
}
