//! Primary error enum for datasource flows.

use std::fmt;
use std::sync::Arc;

use camino::Utf8PathBuf;
use figment::Error as FigmentError;
use thiserror::Error;

use crate::data::MediaType;

/// Errors that can occur while resolving, reading or merging datasources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatasourceError {
    /// A `merge:` URL named fewer than two sub-sources.
    #[error("need at least 2 datasources to merge, found {parts}")]
    MergeArity {
        /// Number of parts found in the URL.
        parts: usize,
    },

    /// Every resolution strategy missed for a datasource name.
    #[error("couldn't resolve datasource '{name}': {}", ResolveMisses(.misses))]
    Unresolved {
        /// Name as supplied by the caller.
        name: String,
        /// Why each strategy declined, in the order they were tried.
        misses: Vec<ResolveMiss>,
    },

    /// A merge sub-source could not be resolved.
    #[error("couldn't resolve datasource '{name}' for merge: {source}")]
    Resolve {
        /// Sub-source identifier.
        name: String,
        /// Underlying resolution failure.
        #[source]
        source: Arc<DatasourceError>,
    },

    /// A datasource failed while reading.
    #[error("couldn't read datasource '{name}': {source}")]
    Read {
        /// Sub-source identifier.
        name: String,
        /// Underlying read failure.
        #[source]
        source: Arc<DatasourceError>,
    },

    /// A merge sub-source decoded to something other than a map.
    #[error(
        "unexpected data type '{found}' for datasource '{name}' (type {media_type}); merge: can only merge maps"
    )]
    NotAMap {
        /// Sub-source identifier.
        name: String,
        /// Concrete type of the decoded document.
        found: &'static str,
        /// Media type the document was decoded with.
        media_type: MediaType,
    },

    /// Payload bytes failed to decode.
    #[error("failed to parse {media_type} data: {source}")]
    Decode {
        /// Media type used to select the decoder.
        media_type: MediaType,
        /// Decoder error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A document failed to encode.
    #[error("failed to encode {media_type} data: {source}")]
    Encode {
        /// Media type being produced.
        media_type: MediaType,
        /// Encoder error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No decoder exists for the media type.
    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(MediaType),

    /// The media type string is malformed.
    #[error("invalid media type '{value}': {reason}")]
    InvalidMediaType {
        /// Offending media type string.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A string could not be parsed as a URL.
    #[error("invalid datasource URL '{value}': {source}")]
    InvalidUrl {
        /// Offending string.
        value: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// A datasource definition was malformed.
    #[error("invalid datasource definition '{value}': {reason}")]
    InvalidDefinition {
        /// Offending definition.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No backend is registered for the URL scheme.
    #[error("no datasource backend for scheme '{scheme}'")]
    UnsupportedScheme {
        /// Scheme without the trailing colon.
        scheme: String,
    },

    /// A filesystem read failed.
    #[error("failed to read file '{path}': {source}")]
    File {
        /// Path that failed.
        path: Utf8PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An environment variable was absent or not valid Unicode.
    #[error("environment variable '{name}' is not set")]
    EnvNotSet {
        /// Variable name.
        name: String,
    },

    /// Reading standard input failed.
    #[error("failed to read standard input: {0}")]
    Stdin(#[source] std::io::Error),

    /// The read context was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The read context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// A merge source outlived the registry that created it.
    #[error("datasource registry was dropped before '{url}' was read")]
    RegistryDropped {
        /// URL of the orphaned source.
        url: String,
    },

    /// Loading registry configuration failed.
    #[error("failed to load datasource configuration: {0}")]
    Config(#[from] Box<FigmentError>),
}

/// Why one resolution strategy declined to produce a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveMiss {
    /// Strategy name (`alias`, `dynamic` or `path`).
    pub strategy: &'static str,
    /// Human-readable reason.
    pub reason: String,
}

impl fmt::Display for ResolveMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

struct ResolveMisses<'a>(&'a [ResolveMiss]);

impl fmt::Display for ResolveMisses<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, miss) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{miss}")?;
        }
        Ok(())
    }
}
