//! Constructors for wrapped `DatasourceError` variants.

use std::sync::Arc;

use camino::Utf8Path;

use super::DatasourceError;
use crate::data::MediaType;

impl DatasourceError {
    /// Wrap a resolution failure with the sub-source name that caused it.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use datasource::DatasourceError;
    /// let inner = Arc::new(DatasourceError::Cancelled);
    /// let e = DatasourceError::resolve("defaults", inner);
    /// assert!(e.to_string().contains("'defaults'"));
    /// ```
    #[must_use]
    pub fn resolve(name: impl Into<String>, source: Arc<Self>) -> Self {
        Self::Resolve {
            name: name.into(),
            source,
        }
    }

    /// Wrap a read failure with the sub-source name that caused it.
    #[must_use]
    pub fn read(name: impl Into<String>, source: Arc<Self>) -> Self {
        Self::Read {
            name: name.into(),
            source,
        }
    }

    /// Construct a decode failure tagged with `media_type`.
    #[must_use]
    pub fn decode(
        media_type: MediaType,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Decode {
            media_type,
            source: source.into(),
        }
    }

    /// Construct an encode failure tagged with `media_type`.
    #[must_use]
    pub fn encode(
        media_type: MediaType,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Encode {
            media_type,
            source: source.into(),
        }
    }

    /// Construct a filesystem failure for `path`.
    #[must_use]
    pub fn file(path: &Utf8Path, source: std::io::Error) -> Self {
        Self::File {
            path: path.to_owned(),
            source,
        }
    }

    /// Construct an invalid-definition error.
    #[must_use]
    pub fn invalid_definition(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when the error came from an expired or cancelled
    /// context, looking through read and resolve wrappers.
    #[must_use]
    pub fn is_context_error(&self) -> bool {
        match self {
            Self::Cancelled | Self::DeadlineExceeded => true,
            Self::Read { source, .. } | Self::Resolve { source, .. } => source.is_context_error(),
            _ => false,
        }
    }
}
