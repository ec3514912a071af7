//! Helpers for running configuration tests inside a `figment::Jail`.
//!
//! A jail gives the closure a private working directory and restores the
//! environment afterwards. Results come back as `anyhow::Result` so tests can
//! keep using `?` and `ensure!`.

use anyhow::{Result, anyhow};
use camino::Utf8Path;

/// Run `f` inside a [`figment::Jail`] and return its output.
///
/// # Errors
///
/// Returns an error if the jail cannot be set up or the closure fails.
pub fn with_jail<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&mut figment::Jail) -> figment::error::Result<T>,
{
    let mut output = None;
    figment::Jail::try_with(|jail| {
        output = Some(f(jail)?);
        Ok(())
    })
    .map_err(|err| anyhow!(err.to_string()))?;
    output.ok_or_else(|| anyhow!("jail closure did not return a value"))
}

/// Write a configuration file named `file_name` into a fresh jail, then run
/// `f` with the jail and the file's relative path.
///
/// # Errors
///
/// Returns an error if the file cannot be created or the closure fails.
pub fn with_config_file<F, T>(file_name: &str, contents: &str, f: F) -> Result<T>
where
    F: FnOnce(&mut figment::Jail, &Utf8Path) -> figment::error::Result<T>,
{
    with_jail(|jail| {
        jail.create_file(file_name, contents)?;
        f(jail, Utf8Path::new(file_name))
    })
}

/// Render any error as a [`figment::Error`] so datasource results can use
/// `?` inside a jail closure.
#[expect(
    clippy::needless_pass_by_value,
    reason = "used as a map_err adaptor, which passes errors by value"
)]
pub fn figment_error<E: ToString>(err: E) -> figment::Error {
    figment::Error::from(err.to_string())
}
