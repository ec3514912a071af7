//! Datasource resolution and merging.
//!
//! A template renderer hands this crate a bare string: a registered alias, a
//! URI such as `env:HOME` or `file:///etc/app.yaml`, or a path relative to
//! the working directory. The [`SourceRegistry`] turns it into a [`Source`],
//! whose [`Source::read`] produces [`Data`] that decodes lazily into a
//! generic document.
//!
//! The `merge:` scheme composes other datasources:
//!
//! ```rust,no_run
//! use datasource::{Context, SourceRegistry};
//!
//! let registry = SourceRegistry::builder().build()?;
//! let data = registry.read(
//!     &Context::background(),
//!     "merge:defaults.yaml|overrides.json",
//!     &[],
//! )?;
//! assert!(data.unmarshal()?.is_object());
//! # Ok::<_, std::sync::Arc<datasource::DatasourceError>>(())
//! ```
//!
//! Later parts win, so list parts from defaults to overrides: above, keys in
//! `overrides.json` replace the same keys from `defaults.yaml`.

mod config;
mod context;
mod data;
mod definition;
mod error;
mod merge;
mod registry;
mod result_ext;
mod source;
#[cfg(test)]
mod test_support;

pub use config::{DatasourceConfig, ENV_PREFIX, RegistryConfig};
pub use context::Context;
pub use data::{Data, MediaType};
pub use definition::{DatasourceArg, parse_source_url};
pub use error::{DatasourceError, ResolveMiss};
pub use merge::{MergeBackend, MergeSource, merge_documents, merge_value};
pub use registry::{Backend, Backends, RegistryBuilder, SourceRegistry};
pub use result_ext::{DatasourceResultExt, SubSourceContextExt};
pub use source::{
    EnvBackend, EnvSource, FileBackend, FileSource, Headers, Source, SourceSpec, StdinBackend,
    StdinSource,
};

/// Result alias used throughout the crate. Errors are shared so a failure
/// can be both returned and wrapped by an enclosing merge.
pub type DatasourceResult<T> = Result<T, std::sync::Arc<DatasourceError>>;
