//! Response bodies and the structural guard applied before anything is cached.
//!
//! A 2xx body only becomes a [`Payload`] when it parses as the requested
//! [`PayloadFormat`] and carries that format's markers.

use crate::error::{Error, Result};
use serde_json::Value;

/// What a response body is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    /// SDMX-JSON: needs `structure` and `dataSets`.
    SdmxJson,
    /// JSON-stat: needs `dimension` and `value`.
    JsonStat,
    /// Either of the JSON dataset formats, detected from the body.
    Dataset,
    /// CSV text with a header line (SDMX-CSV, FRED graph exports).
    Csv,
}

impl PayloadFormat {
    /// File extension used for cache entries of this format.
    pub fn extension(self) -> &'static str {
        match self {
            PayloadFormat::Csv => "csv",
            _ => "json",
        }
    }
}

/// JSON dataset sub-shape, see [`DimensionSet::build`](crate::DimensionSet::build).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    /// SDMX-JSON: ordered dimension descriptors, composite observation keys.
    Sdmx,
    /// JSON-stat: code -> position maps, flat observation keys.
    JsonStat,
}

impl JsonShape {
    pub fn detect(v: &Value) -> Option<Self> {
        if v.get("structure").is_some() || v.get("dataSets").is_some() {
            Some(JsonShape::Sdmx)
        } else if v.get("dimension").is_some() {
            Some(JsonShape::JsonStat)
        } else {
            None
        }
    }
}

/// A parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Parse `bytes` as `format` and check its structural markers.
    ///
    /// ### Arguments
    /// - `bytes`: raw response body, from the network or a cache file.
    /// - `format`: what the caller asked for; [`PayloadFormat::Dataset`] accepts either
    ///   JSON dataset shape.
    ///
    /// ### Errors
    /// Any failure here is a [`Error::MalformedPayload`]: fetching the same URL again
    /// would return the same bytes.
    pub fn parse(bytes: &[u8], format: PayloadFormat) -> Result<Self> {
        match format {
            PayloadFormat::Csv => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| Error::malformed(format!("CSV body is not UTF-8: {e}")))?;
                let header = text.lines().find(|l| !l.trim().is_empty());
                if header.is_none() {
                    return Err(Error::malformed("CSV body has no header line"));
                }
                Ok(Payload::Text(text.to_string()))
            }
            _ => {
                let v: Value = serde_json::from_slice(bytes)
                    .map_err(|e| Error::malformed(format!("body is not valid JSON: {e}")))?;
                check_markers(&v, format)?;
                Ok(Payload::Json(v))
            }
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Result<String> {
        match self {
            Payload::Text(s) => Ok(s),
            Payload::Json(_) => Err(Error::malformed("expected a text payload, got JSON")),
        }
    }
}

fn keys_of(v: &Value) -> Vec<String> {
    v.as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default()
}

fn require_all(v: &Value, keys: &[&str], what: &str) -> Result<()> {
    if keys.iter().all(|k| v.get(k).is_some()) {
        Ok(())
    } else {
        Err(Error::malformed(format!(
            "unexpected {what} response format: keys={:?}",
            keys_of(v)
        )))
    }
}

fn check_markers(v: &Value, format: PayloadFormat) -> Result<()> {
    match format {
        PayloadFormat::SdmxJson => require_all(v, &["structure", "dataSets"], "SDMX-JSON"),
        PayloadFormat::JsonStat => require_all(v, &["dimension", "value"], "JSON-stat"),
        PayloadFormat::Dataset => match JsonShape::detect(v) {
            Some(JsonShape::Sdmx) => check_markers(v, PayloadFormat::SdmxJson),
            Some(JsonShape::JsonStat) => check_markers(v, PayloadFormat::JsonStat),
            None => Err(Error::malformed(format!(
                "not an SDMX-JSON or JSON-stat dataset: keys={:?}",
                keys_of(v)
            ))),
        },
        PayloadFormat::Csv => Ok(()),
    }
}
