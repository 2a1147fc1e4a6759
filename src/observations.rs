//! Observation blocks of SDMX-JSON and JSON-stat datasets.
//!
//! Both are read into an [`ObservationMap`]: the raw keys in source order, tagged with
//! the [`IndexStyle`] the decoder must apply to them.

use crate::error::{Error, Result};
use crate::payload::JsonShape;
use serde_json::Value;
use std::collections::HashMap;

/// How observation keys address the dimension space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStyle {
    /// `"i0:i1:...:iN"`, one position per dimension in axis order.
    Composite,
    /// A single row-major position into the cartesian product of dimension sizes.
    Flat,
}

/// Sparse observations: key -> value, in source order.
///
/// A key that is present with no value maps to `None`; a missing key means there is
/// no observation at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationMap {
    style: IndexStyle,
    entries: Vec<(String, Option<f64>)>,
    lookup: HashMap<String, usize>,
}

impl ObservationMap {
    pub fn new(style: IndexStyle) -> Self {
        Self {
            style,
            entries: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Insert or overwrite the value at `key`, keeping the first-seen position.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<f64>) {
        let key = key.into();
        match self.lookup.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.lookup.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn style(&self) -> IndexStyle {
        self.style
    }

    /// `None` when the key is absent, `Some(None)` when present without a value.
    pub fn get(&self, key: &str) -> Option<Option<f64>> {
        self.lookup.get(key).map(|&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Extract observations from a dataset payload, detecting its shape.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        match JsonShape::detect(payload) {
            Some(JsonShape::Sdmx) => Self::from_sdmx(payload),
            Some(JsonShape::JsonStat) => Self::from_json_stat(payload),
            None => Err(Error::malformed("no observation section in payload")),
        }
    }

    /// SDMX-JSON `dataSets[0]`: either flat `observations` with full composite keys, or
    /// `series.<seriesKey>.observations.<obsKey>` joined as `seriesKey:obsKey`.
    pub fn from_sdmx(payload: &Value) -> Result<Self> {
        let data_set = payload
            .get("dataSets")
            .and_then(|d| d.get(0))
            .ok_or_else(|| Error::malformed("missing observations in JSON: dataSets[0]"))?;

        let mut map = ObservationMap::new(IndexStyle::Composite);
        if let Some(obs) = data_set.get("observations") {
            for (key, record) in object(obs, "dataSets[0].observations")? {
                map.insert(key.clone(), record_value(record));
            }
        } else if let Some(series) = data_set.get("series") {
            for (series_key, s) in object(series, "dataSets[0].series")? {
                let Some(obs) = s.get("observations") else {
                    continue;
                };
                for (obs_key, record) in object(obs, "series observations")? {
                    map.insert(format!("{series_key}:{obs_key}"), record_value(record));
                }
            }
        } else {
            return Err(Error::malformed(
                "missing observations in JSON: dataSets[0].observations",
            ));
        }
        Ok(map)
    }

    /// JSON-stat `value`: an object keyed by flat position, or a dense array. Either way
    /// a `null` value marks a missing observation and is not inserted.
    pub fn from_json_stat(payload: &Value) -> Result<Self> {
        let value = payload
            .get("value")
            .ok_or_else(|| Error::malformed("missing observations in JSON: value"))?;
        let mut map = ObservationMap::new(IndexStyle::Flat);
        match value {
            Value::Object(obj) => {
                for (key, v) in obj.iter().filter(|(_, v)| !v.is_null()) {
                    map.insert(key.clone(), scalar(v));
                }
            }
            Value::Array(arr) => {
                for (i, v) in arr.iter().enumerate() {
                    if !v.is_null() {
                        map.insert(i.to_string(), scalar(v));
                    }
                }
            }
            other => {
                return Err(Error::malformed(format!(
                    "value must be an object or array, got {other}"
                )));
            }
        }
        Ok(map)
    }
}

fn object<'a>(v: &'a Value, what: &str) -> Result<&'a serde_json::Map<String, Value>> {
    v.as_object()
        .ok_or_else(|| Error::malformed(format!("{what} is not an object")))
}

/// First element of an SDMX value record.
fn record_value(record: &Value) -> Option<f64> {
    match record {
        Value::Array(items) => items.first().and_then(scalar),
        other => scalar(other),
    }
}

fn scalar(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_record_is_present_without_value() {
        let p = json!({"structure": {}, "dataSets": [{"observations": {"0:0": [], "0:1": [2.5, 0]}}]});
        let m = ObservationMap::from_sdmx(&p).unwrap();
        assert_eq!(m.get("0:0"), Some(None));
        assert_eq!(m.get("0:1"), Some(Some(2.5)));
        assert_eq!(m.get("1:1"), None);
    }

    #[test]
    fn series_keys_are_joined() {
        let p = json!({"dataSets": [{"series": {"0:1": {"observations": {"3": [1.0]}}}}]});
        let m = ObservationMap::from_sdmx(&p).unwrap();
        assert_eq!(m.get("0:1:3"), Some(Some(1.0)));
    }

    #[test]
    fn dense_nulls_are_absent() {
        let p = json!({"dimension": {}, "value": [1.0, null, 3.0]});
        let m = ObservationMap::from_json_stat(&p).unwrap();
        assert_eq!(m.style(), IndexStyle::Flat);
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("1"), None);
        assert_eq!(m.get("2"), Some(Some(3.0)));
    }
}
