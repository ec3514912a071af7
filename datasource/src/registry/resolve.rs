//! The ordered resolution chain: alias, then dynamic URI, then relative path.

use std::sync::Arc;

use crate::definition::parse_source_url;
use crate::error::ResolveMiss;
use crate::source::Source;
use crate::{DatasourceError, DatasourceResult};

use super::SourceRegistry;

/// Outcome of one strategy. Hard failures travel in the surrounding `Err`.
pub(super) enum Lookup {
    Found(Arc<dyn Source>),
    Miss(String),
}

type Strategy = fn(&SourceRegistry, &str) -> DatasourceResult<Lookup>;

/// Strategies in the order they are attempted. The order is part of the
/// contract: an alias always shadows a URL with the same spelling.
pub(super) const STRATEGIES: [(&str, Strategy); 3] = [
    ("alias", by_alias),
    ("dynamic", by_dynamic),
    ("path", by_path),
];

/// Run every strategy until one finds a source.
pub(super) fn resolve(registry: &SourceRegistry, name: &str) -> DatasourceResult<Arc<dyn Source>> {
    let mut misses = Vec::with_capacity(STRATEGIES.len());
    for (strategy, attempt) in STRATEGIES {
        match attempt(registry, name)? {
            Lookup::Found(source) => {
                tracing::debug!(name, strategy, "resolved datasource");
                return Ok(source);
            }
            Lookup::Miss(reason) => {
                tracing::debug!(name, strategy, %reason, "resolution strategy missed");
                misses.push(ResolveMiss { strategy, reason });
            }
        }
    }
    Err(Arc::new(DatasourceError::Unresolved {
        name: name.to_owned(),
        misses,
    }))
}

fn by_alias(registry: &SourceRegistry, name: &str) -> DatasourceResult<Lookup> {
    Ok(registry.get(name).map_or_else(
        || Lookup::Miss("no alias registered".to_owned()),
        Lookup::Found,
    ))
}

fn by_dynamic(registry: &SourceRegistry, name: &str) -> DatasourceResult<Lookup> {
    miss_on_unrecognised(registry.dynamic(name, None))
}

fn by_path(registry: &SourceRegistry, name: &str) -> DatasourceResult<Lookup> {
    let url = match parse_source_url(name, registry.base_dir()) {
        Ok(url) => url,
        Err(err) => return miss_on_unrecognised(Err(err)),
    };
    miss_on_unrecognised(registry.register(name, url, None))
}

/// Treat "this string is not something I understand" as a miss and every
/// other failure as fatal to the whole resolution.
fn miss_on_unrecognised(result: DatasourceResult<Arc<dyn Source>>) -> DatasourceResult<Lookup> {
    match result {
        Ok(source) => Ok(Lookup::Found(source)),
        Err(err) => match &*err {
            DatasourceError::InvalidUrl { .. }
            | DatasourceError::UnsupportedScheme { .. }
            | DatasourceError::InvalidDefinition { .. } => Ok(Lookup::Miss(err.to_string())),
            _ => Err(err),
        },
    }
}
