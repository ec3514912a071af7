//! Parsing of datasource definitions as given on a command line or in
//! configuration: bare paths, URLs, `-` and `alias=url` pairs.

use std::str::FromStr;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use url::Url;

use crate::{DatasourceError, DatasourceResult};

/// Turn a datasource value into a URL.
///
/// - `-` means standard input (`stdin:`).
/// - Strings that parse as URLs with a scheme of two or more characters are
///   returned unchanged. Single-letter schemes are Windows drive letters and
///   fall through to path handling.
/// - Anything else is a filesystem path, resolved against `base` when
///   relative. A trailing `/` is preserved so directories stay directories,
///   and a `?query` suffix is carried over to the URL.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use datasource::parse_source_url;
///
/// let url = parse_source_url("conf/app.yaml", Utf8Path::new("/srv"))?;
/// assert_eq!(url.as_str(), "file:///srv/conf/app.yaml");
/// assert_eq!(parse_source_url("-", Utf8Path::new("/srv"))?.as_str(), "stdin:");
/// # Ok::<_, std::sync::Arc<datasource::DatasourceError>>(())
/// ```
///
/// # Errors
///
/// Returns [`DatasourceError::InvalidDefinition`] when the value is empty,
/// `base` is not absolute, or the path cannot be expressed as a `file:` URL.
pub fn parse_source_url(value: &str, base: &Utf8Path) -> DatasourceResult<Url> {
    if value.is_empty() {
        return Err(invalid(value, "datasource must not be empty"));
    }
    if value == "-" {
        return Url::parse("stdin:").map_err(|source| {
            Arc::new(DatasourceError::InvalidUrl {
                value: value.to_owned(),
                source,
            })
        });
    }
    if let Ok(url) = Url::parse(value)
        && url.scheme().len() > 1
    {
        return Ok(url);
    }
    path_url(value, base)
}

fn path_url(value: &str, base: &Utf8Path) -> DatasourceResult<Url> {
    let (raw_path, query) = match value.split_once('?') {
        Some((before, after)) => (before, Some(after)),
        None => (value, None),
    };
    let path = Utf8Path::new(raw_path);
    let absolute: Utf8PathBuf = if path.is_absolute() {
        path.to_owned()
    } else if base.is_absolute() {
        base.join(path)
    } else {
        return Err(invalid(value, "relative paths need an absolute base directory"));
    };
    let mut url = Url::from_file_path(&absolute)
        .map_err(|()| invalid(value, "path cannot be expressed as a file URL"))?;
    if value.ends_with('/') && !url.path().ends_with('/') {
        let dir = format!("{}/", url.path());
        url.set_path(&dir);
    }
    url.set_query(query);
    Ok(url)
}

fn invalid(value: &str, reason: &str) -> Arc<DatasourceError> {
    Arc::new(DatasourceError::invalid_definition(value, reason))
}

/// A datasource definition of the form `alias=url`, or a bare URL or path
/// whose alias is derived from its file name.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use datasource::DatasourceArg;
///
/// let arg = DatasourceArg::parse("defaults=file:///etc/app.yaml", Utf8Path::new("/"))?;
/// assert_eq!(arg.alias, "defaults");
///
/// let arg = DatasourceArg::parse("config/overrides.json", Utf8Path::new("/srv"))?;
/// assert_eq!(arg.alias, "overrides");
/// assert_eq!(arg.url.as_str(), "file:///srv/config/overrides.json");
/// # Ok::<_, std::sync::Arc<datasource::DatasourceError>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasourceArg {
    /// Alias the source will be registered under.
    pub alias: String,
    /// Parsed URL.
    pub url: Url,
}

impl DatasourceArg {
    /// Parse a definition, resolving relative paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::InvalidDefinition`] when the alias is empty
    /// or cannot be derived, or when the URL part is invalid.
    pub fn parse(value: &str, base: &Utf8Path) -> DatasourceResult<Self> {
        if let Some((alias, rest)) = value.split_once('=')
            && is_alias(alias)
        {
            let url = parse_source_url(rest, base)?;
            return Ok(Self {
                alias: alias.to_owned(),
                url,
            });
        }
        let url = parse_source_url(value, base)?;
        let alias = derive_alias(&url)
            .ok_or_else(|| invalid(value, "cannot derive an alias; use 'alias=url'"))?;
        Ok(Self { alias, url })
    }
}

impl FromStr for DatasourceArg {
    type Err = Arc<DatasourceError>;

    /// Parse relative to the current working directory.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let cwd = current_dir()?;
        Self::parse(value, &cwd)
    }
}

/// Absolute UTF-8 current working directory.
pub(crate) fn current_dir() -> DatasourceResult<Utf8PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| Arc::new(DatasourceError::file(Utf8Path::new("."), e)))?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|p| {
        invalid(
            &p.to_string_lossy(),
            "current directory is not valid UTF-8",
        )
    })
}

fn is_alias(candidate: &str) -> bool {
    !candidate.is_empty() && !candidate.contains([':', '/', '\\', '?'])
}

fn derive_alias(url: &Url) -> Option<String> {
    let name = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let stem = name.split_once('.').map_or(name, |(head, _)| head);
    (!stem.is_empty()).then(|| stem.to_owned())
}
