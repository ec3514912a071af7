//! Read results and their lazy, cached decoding.
//!
//! A [`Data`] holds the raw payload of a single read together with the URL it
//! came from. Decoding into a generic [`serde_json::Value`] happens on first
//! use and is cached for the life of the instance; reading the source again
//! produces a fresh `Data`.

mod decode;
pub(crate) mod encode;
mod media_type;

pub use media_type::MediaType;

use std::sync::OnceLock;

use serde_json::Value;
use url::Url;

use crate::DatasourceResult;

/// Payload produced by one read from one source.
#[derive(Debug)]
pub struct Data {
    url: Url,
    args: Vec<String>,
    bytes: Vec<u8>,
    explicit: Option<MediaType>,
    media_type: OnceLock<MediaType>,
    decoded: OnceLock<Value>,
}

impl Data {
    /// Wrap `bytes` read from `url`. The media type is inferred on demand.
    #[must_use]
    pub fn new(url: Url, args: Vec<String>, bytes: Vec<u8>) -> Self {
        Self {
            url,
            args,
            bytes,
            explicit: None,
            media_type: OnceLock::new(),
            decoded: OnceLock::new(),
        }
    }

    /// Wrap `bytes` with an explicit media type that overrides inference.
    #[must_use]
    pub fn with_media_type(
        url: Url,
        args: Vec<String>,
        bytes: Vec<u8>,
        media_type: MediaType,
    ) -> Self {
        Self {
            explicit: Some(media_type),
            ..Self::new(url, args, bytes)
        }
    }

    /// URL the payload was read from.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Positional arguments passed to the read.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Raw payload.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DatasourceError::Decode`] tagged `text/plain` when the
    /// payload is not valid UTF-8.
    pub fn as_str(&self) -> DatasourceResult<&str> {
        std::str::from_utf8(&self.bytes)
            .map_err(|e| std::sync::Arc::new(crate::DatasourceError::decode(MediaType::Text, e)))
    }

    /// Consume the data, returning the raw payload.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Resolve the media type of the payload.
    ///
    /// Resolution order: the explicit type given at construction, the `type`
    /// query parameter of the URL, the URL path extension, then a sniff of
    /// the payload (JSON when it opens with `{` or `[`, otherwise
    /// `text/plain`). The result is cached.
    ///
    /// # Examples
    ///
    /// ```
    /// use datasource::{Data, MediaType};
    /// let url = url::Url::parse("file:///etc/app/defaults.yml").expect("valid URL");
    /// let data = Data::new(url, Vec::new(), b"a: 1".to_vec());
    /// assert_eq!(data.media_type()?, MediaType::Yaml);
    /// # Ok::<_, std::sync::Arc<datasource::DatasourceError>>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`crate::DatasourceError::InvalidMediaType`] when the `type`
    /// query parameter is malformed.
    pub fn media_type(&self) -> DatasourceResult<MediaType> {
        if let Some(cached) = self.media_type.get() {
            return Ok(cached.clone());
        }
        let resolved = self.resolve_media_type()?;
        Ok(self.media_type.get_or_init(|| resolved).clone())
    }

    fn resolve_media_type(&self) -> DatasourceResult<MediaType> {
        if let Some(explicit) = &self.explicit {
            return Ok(explicit.clone());
        }
        if let Some((_, value)) = self.url.query_pairs().find(|(key, _)| key == "type") {
            return value.parse::<MediaType>().map_err(std::sync::Arc::new);
        }
        let from_ext = self
            .url
            .path()
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .and_then(|(_, ext)| MediaType::from_extension(ext));
        Ok(from_ext.unwrap_or_else(|| MediaType::sniff(&self.bytes)))
    }

    /// Decode the payload into a generic document, caching the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use datasource::{Data, MediaType};
    /// let url = url::Url::parse("stdin:").expect("valid URL");
    /// let data = Data::with_media_type(url, Vec::new(), b"{\"a\": 1}".to_vec(), MediaType::Json);
    /// assert_eq!(data.unmarshal()?["a"], 1);
    /// # Ok::<_, std::sync::Arc<datasource::DatasourceError>>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`crate::DatasourceError::Decode`] tagged with the media type
    /// when parsing fails, or
    /// [`crate::DatasourceError::UnsupportedMediaType`] when no decoder is
    /// available.
    pub fn unmarshal(&self) -> DatasourceResult<&Value> {
        if let Some(cached) = self.decoded.get() {
            return Ok(cached);
        }
        let media_type = self.media_type()?;
        let value = decode::decode(&media_type, &self.bytes)?;
        Ok(self.decoded.get_or_init(|| value))
    }
}
