//! Deep-merge mechanics for decoded documents.

use serde_json::{Map, Value};

/// Overlay `layer` onto `target`, updating `target` in place.
///
/// Behaviour:
/// - When merging a map into a non-map target, the target is replaced by an
///   empty map first.
/// - Maps are merged recursively: keys are added or overwritten, and nested
///   maps are overlaid.
/// - Sequences and scalars replace `target` wholesale; sequences are never
///   concatenated.
///
/// # Examples
///
/// ```rust
/// use datasource::merge_value;
/// use serde_json::json;
///
/// let mut acc = json!({"a": 1, "b": {"x": 1}});
/// merge_value(&mut acc, json!({"b": {"y": 2}, "c": 3}));
/// assert_eq!(acc, json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3}));
///
/// // Sequences replace existing values.
/// merge_value(&mut acc, json!({"b": [1, 2, 3]}));
/// assert_eq!(acc["b"], json!([1, 2, 3]));
/// ```
pub fn merge_value(target: &mut Value, layer: Value) {
    match layer {
        Value::Object(map) => merge_object(target, map),
        _ => *target = layer,
    }
}

/// Merge the map `map` into `target`, converting a non-map target first.
fn merge_object(target: &mut Value, map: Map<String, Value>) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }

    let Some(target_map) = target.as_object_mut() else {
        return;
    };

    for (key, value) in map {
        match target_map.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target_map.insert(key, value);
            }
        }
    }
}

/// Fold `documents` left to right: the first is the base and each later
/// document takes precedence over everything before it.
///
/// # Examples
///
/// ```rust
/// use datasource::merge_documents;
/// use serde_json::json;
///
/// let docs = [json!({"a": 1, "list": [1, 2]}), json!({"a": 2, "list": [3]})];
/// let merged = merge_documents(docs.into_iter().filter_map(|d| d.as_object().cloned()));
/// assert_eq!(serde_json::Value::Object(merged), json!({"a": 2, "list": [3]}));
/// ```
#[must_use]
pub fn merge_documents<I>(documents: I) -> Map<String, Value>
where
    I: IntoIterator<Item = Map<String, Value>>,
{
    let mut merged = Value::Object(Map::new());
    for document in documents {
        merge_object(&mut merged, document);
    }
    match merged {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Name of the concrete kind of `value`, for diagnostics.
pub(super) const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}
