//! Declarative alias definitions for a [`crate::SourceRegistry`].
//!
//! Definitions are layered with Figment: a TOML, YAML, JSON or dotenv
//! configuration file, overlaid by environment variables
//! prefixed with [`ENV_PREFIX`] (nested keys separated by `__`).
//!
//! ```toml
//! base_dir = "/srv/templates"
//!
//! [datasources.defaults]
//! url = "config/defaults.yaml"
//!
//! [datasources.api]
//! url = "https://example.com/settings.json"
//! headers = { Authorization = ["Bearer abc"] }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_saphyr::Options;
use url::Url;

use crate::definition::{current_dir, parse_source_url};
use crate::source::{FileSource, Headers, Source};
use crate::{Context, Data, DatasourceError, DatasourceResult, DatasourceResultExt, MediaType};

/// Prefix for environment variables overriding configuration.
pub const ENV_PREFIX: &str = "DATASOURCE_";

/// Registry configuration: a base directory and named datasources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Directory relative datasource paths are resolved against. Defaults
    /// to the current working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<Utf8PathBuf>,
    /// Datasources keyed by alias.
    #[serde(default)]
    pub datasources: BTreeMap<String, DatasourceConfig>,
}

/// One named datasource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatasourceConfig {
    /// URL, or a path relative to the base directory.
    pub url: String,
    /// Headers for header-bearing backends.
    #[serde(default, alias = "header", skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
}

impl DatasourceConfig {
    /// Parse [`DatasourceConfig::url`], resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::InvalidDefinition`] for malformed values.
    pub fn parse_url(&self, base: &Utf8Path) -> DatasourceResult<Url> {
        parse_source_url(&self.url, base)
    }

    /// Configured headers, or `None` when there are none.
    #[must_use]
    pub fn headers(&self) -> Option<Headers> {
        (!self.headers.is_empty()).then(|| {
            self.headers
                .iter()
                .map(|(name, values)| (name.clone(), values.clone()))
                .collect()
        })
    }
}

impl RegistryConfig {
    /// Assemble the Figment for `path` (when it names an existing file)
    /// overlaid by `DATASOURCE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or decoded.
    pub fn figment(path: Option<&Utf8Path>) -> DatasourceResult<Figment> {
        let mut figment = Figment::new();
        if let Some(path) = path.filter(|p| p.is_file()) {
            figment = figment.merge(Serialized::defaults(read_document(path)?));
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from `path` and the environment.
    ///
    /// A missing file is not an error; the environment alone is used.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::Config`] when the layered values do not
    /// form a valid configuration.
    pub fn load(path: Option<&Utf8Path>) -> DatasourceResult<Self> {
        Self::figment(path)?.extract().into_datasource()
    }
}

/// Decode a configuration file, choosing the format from its extension
/// (TOML when unrecognised). YAML configuration goes through
/// [`parse_yaml_config`]; every other format uses the datasource decoders.
fn read_document(path: &Utf8Path) -> DatasourceResult<Value> {
    let absolute = if path.is_absolute() {
        path.to_owned()
    } else {
        current_dir()?.join(path)
    };
    let url = Url::from_file_path(&absolute).map_err(|()| {
        Arc::new(DatasourceError::invalid_definition(
            absolute.as_str(),
            "configuration path cannot be expressed as a file URL",
        ))
    })?;
    let raw = FileSource::from_url(url)?.read(&Context::background(), &[])?;
    let data = match path.extension().and_then(MediaType::from_extension) {
        Some(MediaType::Yaml) => return parse_yaml_config(raw.as_str()?),
        Some(_) => raw,
        None => Data::with_media_type(
            raw.url().clone(),
            Vec::new(),
            raw.into_bytes(),
            MediaType::Toml,
        ),
    };
    data.unmarshal().cloned()
}

/// Parse hand-written YAML configuration with strict booleans, so only
/// `true` and `false` are booleans and `yes`/`on` stay strings.
fn parse_yaml_config(text: &str) -> DatasourceResult<Value> {
    serde_saphyr::from_str_with_options(
        text,
        Options {
            strict_booleans: true,
            ..Options::default()
        },
    )
    .map_err(|e| Arc::new(DatasourceError::decode(MediaType::Yaml, e)))
}
