//! Provider-neutral request builder.
//!
//! A [`DatasetQuery`] renders to the fully-qualified URL that is both sent on the wire
//! and used as the cache identity, so the rendering must be stable: segments and
//! parameters keep the order in which they were added.
//!
//! ```
//! # use macropanel_rs::DatasetQuery;
//! let url = DatasetQuery::new("https://example.org/sdmx/")
//!     .param("table", "STS_RT_M")
//!     .param("format", "JSON")
//!     .param_list("geo", ["DE", "FR"])
//!     .to_url();
//! assert_eq!(url, "https://example.org/sdmx?table=STS_RT_M&format=JSON&geo=DE,FR");
//! ```

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

// Allow -, _, . unescaped in codes (common in dataset and series keys)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string()
}

fn enc_join<'a>(parts: impl IntoIterator<Item = &'a str>, sep: &str) -> String {
    parts
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .map(enc)
        .collect::<Vec<_>>()
        .join(sep)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetQuery {
    base_url: String,
    segments: Vec<String>,
    params: Vec<(String, String)>,
}

impl DatasetQuery {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            segments: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Append one path segment (percent-encoded).
    pub fn segment(mut self, segment: &str) -> Self {
        self.segments.push(enc(segment));
        self
    }

    /// Append `name=value`.
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.push((enc(name), enc(value)));
        self
    }

    /// Append `name=v1,v2,...`, keeping the given order. Empty lists are skipped.
    pub fn param_list<'a>(mut self, name: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
        let joined = enc_join(values, ",");
        if !joined.is_empty() {
            self.params.push((enc(name), joined));
        }
        self
    }

    pub fn to_url(&self) -> String {
        let mut url = self.base_url.clone();
        for s in &self.segments {
            url.push('/');
            url.push_str(s);
        }
        if !self.params.is_empty() {
            let query = self
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}

impl std::fmt::Display for DatasetQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_url())
    }
}
