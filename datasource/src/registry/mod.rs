//! Alias bindings plus on-demand resolution of URIs and relative paths.
//!
//! A [`SourceRegistry`] lives for one render invocation. It is created with
//! [`SourceRegistry::builder`], shared as an `Arc`, and dropped when the
//! render finishes. The alias table sits behind a read/write lock so
//! independent merges may resolve concurrently.

mod backends;
mod resolve;

pub use backends::{Backend, Backends};

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::RwLock;
use url::Url;

use crate::definition::current_dir;
use crate::source::{Headers, Source, SourceSpec};
use crate::{Context, Data, DatasourceError, DatasourceResult, RegistryConfig};

/// Alias table and resolver for datasources.
pub struct SourceRegistry {
    aliases: RwLock<HashMap<String, Arc<dyn Source>>>,
    backends: Backends,
    base_dir: Utf8PathBuf,
    this: Weak<Self>,
}

impl SourceRegistry {
    /// Start building a registry with the built-in backends.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry using `backends`, resolving relative paths against the
    /// current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the current directory cannot be determined.
    pub fn new(backends: Backends) -> DatasourceResult<Arc<Self>> {
        Self::builder().backends(backends).build()
    }

    /// Build a registry and bind every datasource defined in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when a configured URL is invalid or has no backend.
    pub fn from_config(config: &RegistryConfig) -> DatasourceResult<Arc<Self>> {
        let mut builder = Self::builder();
        if let Some(base) = &config.base_dir {
            builder = builder.base_dir(base.clone());
        }
        let base = builder.resolved_base_dir()?;
        for (alias, definition) in &config.datasources {
            let url = definition.parse_url(&base)?;
            builder = builder.alias(alias.clone(), url, definition.headers());
        }
        builder.build()
    }

    /// Source bound to `alias`, if any. Performs no I/O.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<Arc<dyn Source>> {
        self.aliases.read().get(alias).cloned()
    }

    /// Construct an unregistered source for a scheme-qualified URI.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::InvalidUrl`] when `uri` is not a URL and
    /// [`DatasourceError::UnsupportedScheme`] when no backend handles its
    /// scheme. Backend construction errors are passed through.
    pub fn dynamic(&self, uri: &str, headers: Option<&Headers>) -> DatasourceResult<Arc<dyn Source>> {
        let url = Url::parse(uri).map_err(|source| {
            Arc::new(DatasourceError::InvalidUrl {
                value: uri.to_owned(),
                source,
            })
        })?;
        self.open(uri, url, headers)
    }

    /// Bind a new source under `alias` and return it.
    ///
    /// Registration is idempotent: when `alias` is already bound the existing
    /// source is returned and `url` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::UnsupportedScheme`] when no backend handles
    /// the URL's scheme, or the backend's construction error.
    pub fn register(
        &self,
        alias: &str,
        url: Url,
        headers: Option<&Headers>,
    ) -> DatasourceResult<Arc<dyn Source>> {
        if let Some(existing) = self.get(alias) {
            tracing::warn!(alias, %url, "datasource alias already registered; keeping existing binding");
            return Ok(existing);
        }
        let source = self.open(alias, url, headers)?;
        let mut aliases = self.aliases.write();
        let bound = aliases.entry(alias.to_owned()).or_insert(source);
        Ok(Arc::clone(bound))
    }

    /// Turn a bare string into a source: exact alias first, then a dynamic
    /// URI, then a path relative to [`SourceRegistry::base_dir`], which is
    /// registered under `name` for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::Unresolved`] naming `name` when every
    /// strategy misses, or the first hard failure a strategy reports.
    pub fn resolve(&self, name: &str) -> DatasourceResult<Arc<dyn Source>> {
        resolve::resolve(self, name)
    }

    /// Resolve `name` and read it.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or the read error wrapped with `name`.
    pub fn read(&self, ctx: &Context, name: &str, args: &[String]) -> DatasourceResult<Data> {
        let source = self.resolve(name)?;
        source.read(ctx, args).map_err(|e| Arc::new(DatasourceError::read(name, e)))
    }

    /// Registered alias names, sorted.
    #[must_use]
    pub fn aliases(&self) -> Vec<String> {
        let mut names: Vec<String> = self.aliases.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of bound aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.read().len()
    }

    /// Whether no aliases are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.read().is_empty()
    }

    /// Directory relative paths are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Backend table used for dynamic resolution.
    #[must_use]
    pub const fn backends(&self) -> &Backends {
        &self.backends
    }

    fn open(
        &self,
        alias: &str,
        url: Url,
        headers: Option<&Headers>,
    ) -> DatasourceResult<Arc<dyn Source>> {
        let backend = self.backends.get(url.scheme()).ok_or_else(|| {
            Arc::new(DatasourceError::UnsupportedScheme {
                scheme: url.scheme().to_owned(),
            })
        })?;
        let spec = SourceSpec::new(alias, url, headers.cloned().unwrap_or_default());
        backend.open(spec, &self.this)
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("aliases", &self.aliases())
            .field("schemes", &self.backends.schemes().collect::<Vec<_>>())
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SourceRegistry`].
///
/// # Examples
///
/// ```
/// use datasource::SourceRegistry;
///
/// let registry = SourceRegistry::builder()
///     .base_dir("/srv/templates")
///     .alias("home", url::Url::parse("env:HOME").expect("valid URL"), None)
///     .build()?;
/// assert_eq!(registry.aliases(), vec!["home".to_owned()]);
/// # Ok::<_, std::sync::Arc<datasource::DatasourceError>>(())
/// ```
#[derive(Debug)]
#[must_use]
pub struct RegistryBuilder {
    backends: Backends,
    base_dir: Option<Utf8PathBuf>,
    aliases: Vec<(String, Url, Headers)>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            backends: Backends::builtin(),
            base_dir: None,
            aliases: Vec::new(),
        }
    }
}

impl RegistryBuilder {
    /// Replace the backend table.
    pub fn backends(mut self, backends: Backends) -> Self {
        self.backends = backends;
        self
    }

    /// Add or replace a single backend.
    pub fn backend(mut self, scheme: &str, backend: impl Backend + 'static) -> Self {
        self.backends.insert(scheme, backend);
        self
    }

    /// Directory relative paths are resolved against. Relative values are
    /// taken relative to the current working directory.
    pub fn base_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Bind `alias` once the registry is built.
    pub fn alias(mut self, alias: impl Into<String>, url: Url, headers: Option<Headers>) -> Self {
        self.aliases
            .push((alias.into(), url, headers.unwrap_or_default()));
        self
    }

    fn resolved_base_dir(&self) -> DatasourceResult<Utf8PathBuf> {
        match &self.base_dir {
            Some(dir) if dir.is_absolute() => Ok(dir.clone()),
            Some(dir) => Ok(current_dir()?.join(dir)),
            None => current_dir(),
        }
    }

    /// Build the registry and bind every queued alias.
    ///
    /// # Errors
    ///
    /// Returns an error when the base directory cannot be determined or an
    /// alias cannot be bound.
    pub fn build(self) -> DatasourceResult<Arc<SourceRegistry>> {
        let base_dir = self.resolved_base_dir()?;
        let registry = Arc::new_cyclic(|this| SourceRegistry {
            aliases: RwLock::new(HashMap::new()),
            backends: self.backends,
            base_dir,
            this: this.clone(),
        });
        for (alias, url, headers) in self.aliases {
            registry.register(&alias, url, Some(&headers))?;
        }
        Ok(registry)
    }
}
