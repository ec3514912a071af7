//! Scheme-keyed backend table consulted by dynamic resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::merge::MergeBackend;
use crate::source::{EnvBackend, FileBackend, Source, SourceSpec, StdinBackend};
use crate::{DatasourceResult, SourceRegistry};

/// Constructs sources for one or more URL schemes.
///
/// Backends only build sources; they must not perform I/O in
/// [`Backend::open`]. Reading happens later through [`Source::read`].
pub trait Backend: Send + Sync + fmt::Debug {
    /// Build a source for `spec`.
    ///
    /// `registry` is the registry doing the resolution. Composite backends
    /// keep it to resolve their own parts at read time; holding it weakly
    /// keeps a registered composite from pinning its registry alive.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::DatasourceError`] when the URL is not acceptable
    /// to this backend.
    fn open(
        &self,
        spec: SourceSpec,
        registry: &Weak<SourceRegistry>,
    ) -> DatasourceResult<Arc<dyn Source>>;
}

/// Mapping from URL scheme to [`Backend`].
///
/// # Examples
///
/// ```
/// use datasource::Backends;
///
/// let backends = Backends::builtin();
/// assert!(backends.get("merge").is_some());
/// assert!(backends.get("s3").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Backends {
    by_scheme: BTreeMap<String, Arc<dyn Backend>>,
}

impl Backends {
    /// An empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            by_scheme: BTreeMap::new(),
        }
    }

    /// The built-in `file`, `env`, `stdin` and `merge` backends.
    #[must_use]
    pub fn builtin() -> Self {
        let mut backends = Self::new();
        backends.insert("file", FileBackend);
        backends.insert("env", EnvBackend);
        backends.insert("stdin", StdinBackend);
        backends.insert("merge", MergeBackend);
        backends
    }

    /// Register `backend` for `scheme`, replacing any previous entry.
    ///
    /// Schemes are matched case-insensitively.
    pub fn insert(&mut self, scheme: &str, backend: impl Backend + 'static) -> &mut Self {
        self.by_scheme
            .insert(scheme.to_ascii_lowercase(), Arc::new(backend));
        self
    }

    /// Backend registered for `scheme`.
    #[must_use]
    pub fn get(&self, scheme: &str) -> Option<&Arc<dyn Backend>> {
        self.by_scheme.get(&scheme.to_ascii_lowercase())
    }

    /// Registered schemes in sorted order.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.by_scheme.keys().map(String::as_str)
    }
}
