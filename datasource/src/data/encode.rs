//! Canonical re-encoding of merged documents.

use std::sync::Arc;

use serde_json::Value;

use crate::{DatasourceError, DatasourceResult};

use super::MediaType;

/// Media type produced by [`to_yaml`].
pub(crate) const CANONICAL: MediaType = MediaType::Yaml;

/// Serialise `value` as YAML. Map keys are emitted in sorted order.
pub(crate) fn to_yaml(value: &Value) -> DatasourceResult<Vec<u8>> {
    serde_yaml::to_string(value)
        .map(String::into_bytes)
        .map_err(|e| Arc::new(DatasourceError::encode(CANONICAL, e)))
}
