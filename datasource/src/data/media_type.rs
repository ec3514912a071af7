//! Media type tags used to select decoders.

use std::fmt;
use std::str::FromStr;

use crate::DatasourceError;

/// Format tag attached to a datasource payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MediaType {
    /// `application/json`
    Json,
    /// `application/array+json`; a JSON document that must be a sequence.
    JsonArray,
    /// `application/yaml`
    Yaml,
    /// `application/toml`
    Toml,
    /// `application/x-env`; dotenv style `KEY=value` lines.
    Env,
    /// `text/plain`
    Text,
    /// `application/json5`
    Json5,
    /// Any other well-formed media type. No decoder is available for it.
    Other(String),
}

impl MediaType {
    /// Canonical MIME string for this media type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Json => "application/json",
            Self::JsonArray => "application/array+json",
            Self::Yaml => "application/yaml",
            Self::Toml => "application/toml",
            Self::Env => "application/x-env",
            Self::Text => "text/plain",
            Self::Json5 => "application/json5",
            Self::Other(other) => other,
        }
    }

    /// Guess the media type from a file extension, without the leading dot.
    ///
    /// # Examples
    ///
    /// ```
    /// use datasource::MediaType;
    /// assert_eq!(MediaType::from_extension("YML"), Some(MediaType::Yaml));
    /// assert_eq!(MediaType::from_extension("exe"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "json5" => Some(Self::Json5),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "env" => Some(Self::Env),
            "txt" | "text" => Some(Self::Text),
            _ => None,
        }
    }

    /// Guess the media type from the leading bytes of a payload.
    ///
    /// Only JSON is recognised; anything else is treated as plain text.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{' | b'[') => Self::Json,
            _ => Self::Text,
        }
    }
}

impl FromStr for MediaType {
    type Err = DatasourceError;

    /// Parse a MIME string, ignoring parameters such as `charset`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let essence = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.is_empty() {
            return Err(DatasourceError::InvalidMediaType {
                value: value.to_owned(),
                reason: "media type is empty",
            });
        }
        let Some((kind, subtype)) = essence.split_once('/') else {
            return Err(DatasourceError::InvalidMediaType {
                value: value.to_owned(),
                reason: "missing '/' separator",
            });
        };
        if kind.is_empty() || subtype.is_empty() {
            return Err(DatasourceError::InvalidMediaType {
                value: value.to_owned(),
                reason: "type and subtype must be non-empty",
            });
        }
        Ok(match essence.as_str() {
            "application/json" | "text/json" => Self::Json,
            "application/array+json" => Self::JsonArray,
            "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => Self::Yaml,
            "application/toml" => Self::Toml,
            "application/x-env" => Self::Env,
            "text/plain" => Self::Text,
            "application/json5" => Self::Json5,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
