//! `env:` backend reading a single environment variable.

use std::sync::{Arc, Weak};

use url::Url;

use crate::{Backend, Context, Data, DatasourceError, DatasourceResult, SourceRegistry};

use super::{Source, SourceSpec};

/// Builds [`EnvSource`]s for `env:` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvBackend;

impl Backend for EnvBackend {
    fn open(
        &self,
        spec: SourceSpec,
        _registry: &Weak<SourceRegistry>,
    ) -> DatasourceResult<Arc<dyn Source>> {
        Ok(Arc::new(EnvSource::from_url(spec.url)?))
    }
}

/// Reads the variable named by `env:NAME` or `env:///NAME`.
///
/// The media type follows the usual inference, so `env:CONFIG?type=application/yaml`
/// decodes the variable as YAML.
#[derive(Debug, Clone)]
pub struct EnvSource {
    url: Url,
    name: String,
}

impl EnvSource {
    /// Build a source for an `env:` URL.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::InvalidDefinition`] when the URL names no
    /// variable.
    pub fn from_url(url: Url) -> DatasourceResult<Self> {
        let name = url.path().trim_start_matches('/').to_owned();
        if name.is_empty() {
            return Err(Arc::new(DatasourceError::invalid_definition(
                url.as_str(),
                "env: URL must name a variable",
            )));
        }
        Ok(Self { url, name })
    }

    /// Variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Source for EnvSource {
    fn read(&self, ctx: &Context, args: &[String]) -> DatasourceResult<Data> {
        ctx.check()?;
        let value = std::env::var(&self.name).map_err(|_| {
            Arc::new(DatasourceError::EnvNotSet {
                name: self.name.clone(),
            })
        })?;
        Ok(Data::new(self.url.clone(), args.to_vec(), value.into_bytes()))
    }
}
