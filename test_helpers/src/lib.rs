//! Test helpers shared across crates in the datasource workspace.
//!
//! - [`env`]: serialised environment-variable guards.
//! - [`cwd`]: a guard that changes and restores the working directory.
//! - [`figment`]: wrappers around `figment::Jail`.
//! - [`documents`]: temporary directories populated with datasource files.

pub mod cwd;
pub mod documents;
pub mod env;
pub mod figment;
