//! Case-insensitive header maps attached to source definitions.

use std::collections::BTreeMap;

use uncased::{Uncased, UncasedStr};

/// Header name to values, compared case-insensitively.
///
/// # Examples
///
/// ```
/// use datasource::Headers;
///
/// let mut headers = Headers::new();
/// headers.append("Accept", "application/json");
/// assert_eq!(headers.get("accept"), Some(&["application/json".to_owned()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<Uncased<'static>, Vec<String>>);

impl Headers {
    /// An empty header map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add `value` to the values recorded for `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0
            .entry(Uncased::new(name.into()))
            .or_default()
            .push(value.into());
    }

    /// Values recorded for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(UncasedStr::new(name)).map(Vec::as_slice)
    }

    /// Iterate over header names and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no headers are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: IntoIterator<Item = String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (key, values) in iter {
            let name: String = key.into();
            for value in values {
                headers.append(name.clone(), value);
            }
        }
        headers
    }
}
