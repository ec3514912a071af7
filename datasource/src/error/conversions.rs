//! Trait-based conversions between external error types and `DatasourceError`.

use figment::Error as FigmentError;

use super::DatasourceError;

impl From<FigmentError> for DatasourceError {
    fn from(e: FigmentError) -> Self {
        Self::Config(Box::new(e))
    }
}

impl From<DatasourceError> for FigmentError {
    /// Allow using `?` in tests that return `figment::Error`.
    fn from(e: DatasourceError) -> Self {
        match e {
            DatasourceError::Config(fe) => *fe,
            other => Self::from(other.to_string()),
        }
    }
}
