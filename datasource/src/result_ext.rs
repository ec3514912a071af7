//! Extensions for mapping errors to `DatasourceResult` concisely.
//!
//! - Use [`DatasourceResultExt::into_datasource`] for error types that
//!   implement `Into<DatasourceError>` (e.g., `figment::Error`).
//! - Use [`SubSourceContextExt`] to attach the sub-source name to a failure
//!   raised while resolving or reading it.
//!
//! # Examples
//!
//! ```
//! use datasource::{DatasourceResult, DatasourceResultExt};
//!
//! fn extract() -> DatasourceResult<String> {
//!     let figment = figment::Figment::new();
//!     figment.extract_inner::<String>("missing").into_datasource()
//! }
//! assert!(extract().is_err());
//! ```

use std::sync::Arc;

use crate::{DatasourceError, DatasourceResult};

/// Generic extension for mapping any `Result<T, E>` with
/// `E: Into<DatasourceError>` into a `DatasourceResult<T>`.
pub trait DatasourceResultExt<T, E> {
    /// Convert `Result<T, E>` into `DatasourceResult<T>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into
    /// `Arc<DatasourceError>`.
    fn into_datasource(self) -> DatasourceResult<T>;
}

impl<T, E> DatasourceResultExt<T, E> for Result<T, E>
where
    E: Into<DatasourceError>,
{
    fn into_datasource(self) -> DatasourceResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}

/// Attach a sub-source name to resolution and read failures.
pub trait SubSourceContextExt<T> {
    /// Wrap the error as [`DatasourceError::Resolve`].
    ///
    /// # Errors
    ///
    /// Returns the wrapped error when the input is `Err`.
    fn resolving(self, name: &str) -> DatasourceResult<T>;

    /// Wrap the error as [`DatasourceError::Read`].
    ///
    /// # Errors
    ///
    /// Returns the wrapped error when the input is `Err`.
    fn reading(self, name: &str) -> DatasourceResult<T>;
}

impl<T> SubSourceContextExt<T> for DatasourceResult<T> {
    fn resolving(self, name: &str) -> DatasourceResult<T> {
        self.map_err(|e| Arc::new(DatasourceError::resolve(name, e)))
    }

    fn reading(self, name: &str) -> DatasourceResult<T> {
        self.map_err(|e| Arc::new(DatasourceError::read(name, e)))
    }
}
