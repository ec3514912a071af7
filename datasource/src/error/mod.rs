//! Error types produced while resolving, reading and merging datasources.

mod constructors;
mod conversions;
mod types;

pub use types::{DatasourceError, ResolveMiss};
