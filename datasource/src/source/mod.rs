//! The backend contract and the built-in reference backends.
//!
//! Every datasource, whatever its scheme, is consumed through [`Source`]. The
//! registry never inspects a source beyond that one method, so new backends
//! plug in by implementing [`crate::Backend`] and registering it for a scheme.

mod env;
mod file;
mod headers;
mod stdin;

pub use env::{EnvBackend, EnvSource};
pub use file::{FileBackend, FileSource};
pub use headers::Headers;
pub use stdin::{StdinBackend, StdinSource};

use std::fmt;

use url::Url;

use crate::{Context, Data, DatasourceResult};

/// A readable datasource.
///
/// Implementations must be cheap to share behind an [`std::sync::Arc`]; the
/// registry hands out clones of the same instance to every caller.
pub trait Source: Send + Sync + fmt::Debug {
    /// Read the source, producing a fresh [`Data`].
    ///
    /// # Errors
    ///
    /// Returns a [`crate::DatasourceError`] when the context has expired or
    /// the backend fails to read.
    fn read(&self, ctx: &Context, args: &[String]) -> DatasourceResult<Data>;
}

/// Everything a backend needs to construct a [`Source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Alias the source is bound under, or the literal string it was
    /// resolved from.
    pub alias: String,
    /// Fully-qualified URL.
    pub url: Url,
    /// Headers for backends that speak a header-bearing protocol.
    pub headers: Headers,
}

impl SourceSpec {
    /// Build a spec from its parts.
    #[must_use]
    pub fn new(alias: impl Into<String>, url: Url, headers: Headers) -> Self {
        Self {
            alias: alias.into(),
            url,
            headers,
        }
    }
}
