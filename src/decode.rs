//! Tabular Decoder: [`ObservationMap`] + [`DimensionSet`] -> [`TidyTable`].
//!
//! Decoding is pure and all-or-nothing: the first bad key aborts the whole table.
//!
//! Flat keys are unravelled row-major with the **first** declared dimension varying
//! slowest:
//!
//! ```text
//! flat = Σ_d index_d × Π_{d' > d} size_d'
//! ```

use crate::error::{Error, Result};
use crate::models::{Cell, DimensionSet, Row, TidyTable, VALUE_COLUMN};
use crate::observations::{IndexStyle, ObservationMap};
use crate::payload::Payload;
use log::debug;
use serde_json::Value;

/// Decode `observations` against `dimensions`.
///
/// ### Arguments
/// - `observations`: sparse values; their [`IndexStyle`] picks the key strategy.
/// - `dimensions`: axis order and categories the keys index into.
///
/// ### Errors
/// - [`Error::IndexOutOfRange`] when a key points past a dimension's category count,
///   or a flat key past the address space.
/// - [`Error::MalformedPayload`] when a key cannot be parsed, is not in canonical
///   form, or has the wrong arity; also when a time alias clashes with a `period`
///   dimension.
pub fn decode(observations: &ObservationMap, dimensions: &DimensionSet) -> Result<TidyTable> {
    decode_with(observations, dimensions, LabelMode::Label)
}

/// Which category text lands in the dimension columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelMode {
    /// Human-readable label, falling back to the code.
    #[default]
    Label,
    /// Stable machine code; what panel joins key on.
    Code,
}

/// [`decode`] with an explicit [`LabelMode`].
pub fn decode_with(
    observations: &ObservationMap,
    dimensions: &DimensionSet,
    mode: LabelMode,
) -> Result<TidyTable> {
    let rows = match observations.style() {
        IndexStyle::Composite => decode_composite(observations, dimensions, mode)?,
        IndexStyle::Flat => decode_flat(observations, dimensions, mode)?,
    };
    debug!(
        "decoded {} rows from {} observations over {} dimensions",
        rows.len(),
        observations.len(),
        dimensions.len()
    );
    let mut columns: Vec<String> = dimensions.order().to_vec();
    columns.push(VALUE_COLUMN.to_string());
    TidyTable::new(columns, rows).normalize_time_column()
}

/// Parse `"i0:i1:...:iN"` into one position per dimension.
pub fn parse_composite_key(key: &str, arity: usize) -> Result<Vec<usize>> {
    let parts: Vec<&str> = key.split(':').collect();
    if parts.len() != arity {
        return Err(Error::malformed(format!(
            "observation key {key:?} has {} positions, expected {arity}",
            parts.len()
        )));
    }
    parts
        .iter()
        .map(|p| {
            p.trim()
                .parse::<usize>()
                .map_err(|_| Error::malformed(format!("observation key {key:?}: bad index {p:?}")))
        })
        .collect()
}

/// Split a flat position into per-dimension coordinates.
///
/// The first coordinate is not reduced modulo its size, so a flat index past the end
/// of the address space surfaces as an out-of-range first coordinate.
pub fn unravel(flat: usize, sizes: &[usize]) -> Vec<usize> {
    let mut coords = vec![0; sizes.len()];
    let mut rest = flat;
    for d in (0..sizes.len()).rev() {
        if d == 0 || sizes[d] == 0 {
            coords[d] = rest;
            rest = 0;
        } else {
            coords[d] = rest % sizes[d];
            rest /= sizes[d];
        }
    }
    coords
}

fn build_row(
    coords: &[usize],
    dimensions: &DimensionSet,
    value: Option<f64>,
    mode: LabelMode,
) -> Result<Row> {
    let mut row = Row::new();
    for (dim, &idx) in dimensions.iter().zip(coords) {
        let category = dim.category(idx).ok_or_else(|| Error::IndexOutOfRange {
            dimension: dim.id.clone(),
            index: idx,
            size: dim.size(),
        })?;
        let text = match mode {
            LabelMode::Label => category.display(),
            LabelMode::Code => category.code.as_str(),
        };
        row.insert(dim.id.clone(), Cell::Label(text.to_string()));
    }
    row.insert(VALUE_COLUMN, Cell::from(value));
    Ok(row)
}

fn decode_composite(obs: &ObservationMap, dims: &DimensionSet, mode: LabelMode) -> Result<Vec<Row>> {
    let arity = dims.len();
    obs.iter()
        .map(|(key, value)| {
            let coords = parse_composite_key(key, arity)?;
            build_row(&coords, dims, value, mode)
        })
        .collect()
}

fn decode_flat(obs: &ObservationMap, dims: &DimensionSet, mode: LabelMode) -> Result<Vec<Row>> {
    let sizes = dims.sizes();
    let space = dims.address_space();
    let mut positions = obs
        .iter()
        .map(|(key, value)| {
            let flat = parse_flat_key(key)?;
            if space.is_some_and(|s| flat >= s) {
                return Err(past_address_space(flat, dims, &sizes));
            }
            Ok((flat, value))
        })
        .collect::<Result<Vec<_>>>()?;
    // Ascending flat order is the row-major enumeration restricted to present keys.
    positions.sort_by_key(|&(flat, _)| flat);
    positions
        .into_iter()
        .map(|(flat, value)| build_row(&unravel(flat, &sizes), dims, value, mode))
        .collect()
}

/// Flat keys must be the decimal form of their position, so `"01"` or `" 1"` cannot
/// alias `"1"`.
fn parse_flat_key(key: &str) -> Result<usize> {
    match key.parse::<usize>() {
        Ok(flat) if flat.to_string() == key => Ok(flat),
        _ => Err(Error::malformed(format!(
            "flat observation key {key:?} is not a canonical integer"
        ))),
    }
}

fn past_address_space(flat: usize, dims: &DimensionSet, sizes: &[usize]) -> Error {
    match dims.iter().next() {
        Some(first) => Error::IndexOutOfRange {
            dimension: first.id.clone(),
            index: unravel(flat, sizes)[0],
            size: first.size(),
        },
        // No dimensions: the only valid position is 0.
        None => Error::IndexOutOfRange {
            dimension: String::new(),
            index: flat,
            size: 1,
        },
    }
}

/// A dataset ready to decode: its dimension index plus its observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub dimensions: DimensionSet,
    pub observations: ObservationMap,
}

impl Dataset {
    /// Build both halves from an SDMX-JSON or JSON-stat document.
    pub fn from_json(payload: &Value) -> Result<Self> {
        let dimensions = DimensionSet::build(payload)?;
        let observations = ObservationMap::from_payload(payload)?;
        Ok(Self {
            dimensions,
            observations,
        })
    }

    pub fn from_payload(payload: &Payload) -> Result<Self> {
        let json = payload
            .as_json()
            .ok_or_else(|| Error::malformed("dataset payload must be JSON"))?;
        Self::from_json(json)
    }

    pub fn style(&self) -> IndexStyle {
        self.observations.style()
    }

    pub fn decode(&self) -> Result<TidyTable> {
        decode(&self.observations, &self.dimensions)
    }

    pub fn decode_with(&self, mode: LabelMode) -> Result<TidyTable> {
        decode_with(&self.observations, &self.dimensions, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unravel_first_dimension_slowest() {
        let sizes = [2, 3, 4];
        assert_eq!(unravel(0, &sizes), vec![0, 0, 0]);
        assert_eq!(unravel(1, &sizes), vec![0, 0, 1]);
        assert_eq!(unravel(4, &sizes), vec![0, 1, 0]);
        assert_eq!(unravel(12, &sizes), vec![1, 0, 0]);
        assert_eq!(unravel(23, &sizes), vec![1, 2, 3]);
        assert_eq!(unravel(24, &sizes), vec![2, 0, 0]);
    }

    #[test]
    fn composite_key_arity_and_digits() {
        assert_eq!(parse_composite_key("0:2:1", 3).unwrap(), vec![0, 2, 1]);
        assert!(parse_composite_key("0:2", 3).is_err());
        assert!(parse_composite_key("0:x:1", 3).is_err());
        assert!(parse_composite_key("0:-1:1", 3).is_err());
    }
}
