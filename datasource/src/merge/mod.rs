//! The `merge:` composite datasource.
//!
//! URI format is `merge:<source 1>|<source 2>[|<source n>...]`, where each
//! part is a registered alias, any URI a backend understands, or a path
//! relative to the registry's base directory. Parts are read in order and
//! deep-merged so that later parts override earlier ones; the result is
//! published as YAML.
//!
//! Query strings and fragments on the outer URL belong to the merged result,
//! not to any part. Parts that need their own headers or query strings must
//! be registered under an alias first and referenced by that alias.

mod document;

pub use document::{merge_documents, merge_value};

use std::sync::{Arc, Weak};

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use url::Url;

use crate::data::encode;
use crate::result_ext::SubSourceContextExt;
use crate::source::{Source, SourceSpec};
use crate::{Backend, Context, Data, DatasourceError, DatasourceResult, SourceRegistry};

/// Builds [`MergeSource`]s for `merge:` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeBackend;

impl Backend for MergeBackend {
    fn open(
        &self,
        spec: SourceSpec,
        registry: &Weak<SourceRegistry>,
    ) -> DatasourceResult<Arc<dyn Source>> {
        Ok(Arc::new(MergeSource::new(spec.url, Weak::clone(registry))))
    }
}

/// Composite source merging the documents named in its URL.
#[derive(Debug, Clone)]
pub struct MergeSource {
    url: Url,
    registry: Weak<SourceRegistry>,
}

impl MergeSource {
    /// Build a merge source resolving its parts through `registry`.
    #[must_use]
    pub const fn new(url: Url, registry: Weak<SourceRegistry>) -> Self {
        Self { url, registry }
    }

    /// The pipe-separated parts of the URL, percent-decoded so they match
    /// alias names and paths as they were written.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::MergeArity`] when fewer than two parts are
    /// present, or [`DatasourceError::InvalidDefinition`] when a part does
    /// not decode to UTF-8.
    pub fn parts(&self) -> DatasourceResult<Vec<String>> {
        let raw: Vec<&str> = self.url.path().split('|').collect();
        if raw.len() < 2 {
            return Err(Arc::new(DatasourceError::MergeArity { parts: raw.len() }));
        }
        raw.into_iter()
            .map(|part| {
                percent_decode_str(part)
                    .decode_utf8()
                    .map(|decoded| decoded.into_owned())
                    .map_err(|e| {
                        Arc::new(DatasourceError::invalid_definition(
                            self.url.as_str(),
                            format!("merge part '{part}' is not valid UTF-8: {e}"),
                        ))
                    })
            })
            .collect()
    }

    fn read_map(
        registry: &SourceRegistry,
        ctx: &Context,
        part: &str,
        args: &[String],
    ) -> DatasourceResult<Map<String, Value>> {
        ctx.check().reading(part)?;
        let source = registry.resolve(part).resolving(part)?;
        tracing::debug!(part, "reading merge part");
        let data = source.read(ctx, args).reading(part)?;
        into_map(part, &data)
    }
}

impl Source for MergeSource {
    /// `args` carry no meaning for merging; they are passed through to every
    /// part's read.
    fn read(&self, ctx: &Context, args: &[String]) -> DatasourceResult<Data> {
        let parts = self.parts()?;
        let registry = self.registry.upgrade().ok_or_else(|| {
            Arc::new(DatasourceError::RegistryDropped {
                url: self.url.to_string(),
            })
        })?;

        let maps = parts
            .iter()
            .map(|part| Self::read_map(&registry, ctx, part, args))
            .collect::<DatasourceResult<Vec<_>>>()?;
        tracing::debug!(parts = parts.len(), url = %self.url, "merging datasources");

        let merged = Value::Object(merge_documents(maps));
        let bytes = encode::to_yaml(&merged)?;
        Ok(Data::with_media_type(
            self.url.clone(),
            args.to_vec(),
            bytes,
            encode::CANONICAL,
        ))
    }
}

/// Decode `data` and insist that it is a map.
fn into_map(part: &str, data: &Data) -> DatasourceResult<Map<String, Value>> {
    let media_type = data.media_type().reading(part)?;
    match data.unmarshal().reading(part)? {
        Value::Object(map) => Ok(map.clone()),
        other => Err(Arc::new(DatasourceError::NotAMap {
            name: part.to_owned(),
            found: document::kind_of(other),
            media_type,
        })),
    }
}

#[cfg(test)]
mod tests;
