use std::collections::BTreeMap;

/// Fallback used when `title` is absent or blank.
pub const DEFAULT_TITLE: &str = "Title";
/// Fallback used when `description` is absent or blank.
pub const DEFAULT_DESCRIPTION: &str = "Description";
/// Fallback used when `siteName` is absent or blank.
pub const DEFAULT_SITE_NAME: &str = "yehezgun.com";
/// Fallback used when `social` is absent or blank.
pub const DEFAULT_SOCIAL: &str = "Twitter: @yehezgun";

/// Raw, untrusted request parameters keyed by query parameter name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawParams {
    values: BTreeMap<String, String>,
}

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. The first value for a key wins, matching [`RawParams::from_query`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse an `application/x-www-form-urlencoded` query string (without the leading `?`).
    ///
    /// Values that are not valid UTF-8 once decoded, or that carry a malformed `%` escape, are
    /// kept as the empty string so the normalizer replaces them with a default.
    pub fn from_query(query: &str) -> Self {
        let mut out = Self::new();
        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let Some(key) = form_decode(raw_key) else {
                continue;
            };
            let value = form_decode(raw_value).unwrap_or_default();
            out.insert(key, value);
        }
        out
    }
}

impl<K, V> FromIterator<(K, V)> for RawParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

/// Decode one form-encoded component: `+` is a space, `%XX` is a byte.
fn form_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
                let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
                let (hi, lo) = hi.zip(lo)?;
                out.push(((hi << 4) | lo) as u8);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).ok()
}

/// Normalized, always-populated content driving one image.
///
/// Every field is trimmed; the four text fields are never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentModel {
    pub title: String,
    pub description: String,
    pub site_name: String,
    pub social: String,
    /// Trimmed avatar URL; empty means "no URL supplied".
    pub image_url: String,
}

impl ContentModel {
    pub fn has_avatar_url(&self) -> bool {
        !self.image_url.is_empty()
    }
}

impl Default for ContentModel {
    fn default() -> Self {
        normalize(&RawParams::new())
    }
}

/// Validate and default raw request parameters. Pure and total.
pub fn normalize(params: &RawParams) -> ContentModel {
    fn field(params: &RawParams, key: &str, default: &str) -> String {
        match params.get(key).map(str::trim) {
            Some(v) if !v.is_empty() => v.to_owned(),
            _ => default.to_owned(),
        }
    }

    ContentModel {
        title: field(params, "title", DEFAULT_TITLE),
        description: field(params, "description", DEFAULT_DESCRIPTION),
        site_name: field(params, "siteName", DEFAULT_SITE_NAME),
        social: field(params, "social", DEFAULT_SOCIAL),
        image_url: field(params, "image", ""),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/content/model.rs"]
mod tests;
