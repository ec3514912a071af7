//! Decoders turning raw payloads into generic documents.

use serde_json::{Map, Value};

use crate::{DatasourceError, DatasourceResult};

use super::MediaType;

/// Decode `bytes` according to `media_type`.
///
/// # Errors
///
/// Returns [`DatasourceError::Decode`] tagged with `media_type` when the
/// payload is malformed, or [`DatasourceError::UnsupportedMediaType`] when no
/// decoder exists.
pub(super) fn decode(media_type: &MediaType, bytes: &[u8]) -> DatasourceResult<Value> {
    let decoded = match media_type {
        MediaType::Json => serde_json::from_slice(bytes).map_err(|e| fail(media_type, e)),
        MediaType::JsonArray => decode_json_array(bytes),
        MediaType::Yaml => decode_yaml(utf8(media_type, bytes)?),
        MediaType::Toml => decode_toml(utf8(media_type, bytes)?),
        MediaType::Env => decode_env(bytes),
        MediaType::Text => Ok(Value::String(utf8(media_type, bytes)?.to_owned())),
        MediaType::Json5 => decode_json5(utf8(media_type, bytes)?),
        MediaType::Other(_) => Err(DatasourceError::UnsupportedMediaType(media_type.clone())),
    };
    decoded.map_err(std::sync::Arc::new)
}

fn fail(
    media_type: &MediaType,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> DatasourceError {
    DatasourceError::decode(media_type.clone(), err)
}

fn utf8<'a>(media_type: &MediaType, bytes: &'a [u8]) -> DatasourceResult<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| std::sync::Arc::new(fail(media_type, e)))
}

fn decode_json_array(bytes: &[u8]) -> Result<Value, DatasourceError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| fail(&MediaType::JsonArray, e))?;
    if value.is_array() {
        Ok(value)
    } else {
        Err(fail(&MediaType::JsonArray, "expected a JSON array"))
    }
}

/// Parse YAML with the same scalar resolution the canonical encoder relies
/// on, so merged output reads back unchanged. `yes`, `1_000` and dates stay
/// strings.
fn decode_yaml(text: &str) -> Result<Value, DatasourceError> {
    serde_yaml::from_str(text).map_err(|e| fail(&MediaType::Yaml, e))
}

fn decode_toml(text: &str) -> Result<Value, DatasourceError> {
    let table: toml::Table = toml::from_str(text).map_err(|e| fail(&MediaType::Toml, e))?;
    Ok(toml_to_json(toml::Value::Table(table)))
}

/// Convert TOML to JSON, rendering datetimes as RFC 3339 strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn decode_env(bytes: &[u8]) -> Result<Value, DatasourceError> {
    let mut map = Map::new();
    for entry in dotenvy::from_read_iter(bytes) {
        let (key, value) = entry.map_err(|e| fail(&MediaType::Env, e))?;
        map.insert(key, Value::String(value));
    }
    Ok(Value::Object(map))
}

#[cfg(feature = "json5")]
fn decode_json5(text: &str) -> Result<Value, DatasourceError> {
    json5::from_str(text).map_err(|e| fail(&MediaType::Json5, e))
}

#[cfg(not(feature = "json5"))]
fn decode_json5(_text: &str) -> Result<Value, DatasourceError> {
    Err(fail(
        &MediaType::Json5,
        "json5 feature disabled: enable the 'json5' feature to support this media type",
    ))
}
