//! Dimension Index: provider metadata -> [`DimensionSet`].
//!
//! Two metadata shapes are understood:
//!
//! - **SDMX-JSON** (`structure.dimensions`): ordered arrays of dimension descriptors,
//!   each with an ordered `values` array. Array position is the index position. Series
//!   dimensions, when present, come before observation dimensions.
//! - **JSON-stat** (`id`, `size`, `dimension`): per dimension a `category.index` mapping
//!   code -> position (or an array of codes) and a parallel `category.label` mapping
//!   code -> label. The mapping is inverted into a position -> code table.

use crate::error::{Error, Result};
use crate::models::{Category, Dimension, DimensionSet, VALUE_COLUMN};
use crate::payload::JsonShape;
use serde::Serialize;
use serde_json::{Map, Value};

/// One line of [`DimensionSet::describe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeEntry {
    pub dimension: String,
    pub code: String,
    pub label: Option<String>,
}

impl DimensionSet {
    /// Build the dimension set from a whole dataset payload, detecting its shape.
    ///
    /// ### Errors
    /// - [`Error::MissingMetadata`] when the dimension block is absent.
    /// - [`Error::MalformedPayload`] when it is present but inconsistent.
    pub fn build(payload: &Value) -> Result<DimensionSet> {
        match JsonShape::detect(payload) {
            Some(JsonShape::Sdmx) => Self::from_sdmx(payload),
            Some(JsonShape::JsonStat) => Self::from_json_stat(payload),
            None => Err(Error::missing_metadata(
                "neither structure.dimensions nor dimension found in payload",
            )),
        }
    }

    /// Shape A: `structure.dimensions.{series,observation}`.
    pub fn from_sdmx(payload: &Value) -> Result<DimensionSet> {
        let dims = payload
            .get("structure")
            .and_then(|s| s.get("dimensions"))
            .ok_or_else(|| Error::missing_metadata("structure.dimensions"))?;
        let observation = dims
            .get("observation")
            .ok_or_else(|| Error::missing_metadata("structure.dimensions.observation"))?;

        let mut out = Vec::new();
        if let Some(series) = dims.get("series") {
            out.extend(sdmx_descriptors(series, "series")?);
        }
        out.extend(sdmx_descriptors(observation, "observation")?);
        finish(out)
    }

    /// Shape B: `id` + `size` + `dimension.<id>.category`.
    pub fn from_json_stat(payload: &Value) -> Result<DimensionSet> {
        let dimension = payload
            .get("dimension")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::missing_metadata("dimension"))?;

        // JSON-stat 2.0 puts `id`/`size` at the top; 1.x-style responses repeat them
        // inside the dimension block.
        let ids_value = payload
            .get("id")
            .or_else(|| dimension.get("id"))
            .ok_or_else(|| Error::missing_metadata("id"))?;
        let ids = string_array(ids_value, "id")?;
        let sizes = match payload.get("size").or_else(|| dimension.get("size")) {
            Some(v) => Some(usize_array(v, "size")?),
            None => None,
        };
        if let Some(sizes) = &sizes {
            if sizes.len() != ids.len() {
                return Err(Error::malformed(format!(
                    "size has {} entries but id has {}",
                    sizes.len(),
                    ids.len()
                )));
            }
        }

        let mut out = Vec::with_capacity(ids.len());
        for (axis, id) in ids.iter().enumerate() {
            let desc = dimension
                .get(id)
                .ok_or_else(|| Error::missing_metadata(format!("dimension.{id}")))?;
            let category = desc
                .get("category")
                .ok_or_else(|| Error::missing_metadata(format!("dimension.{id}.category")))?;
            let labels = category.get("label").and_then(Value::as_object);
            let codes = reverse_index(id, category.get("index"), labels)?;
            if let Some(sizes) = &sizes {
                if sizes[axis] != codes.len() {
                    return Err(Error::malformed(format!(
                        "dimension {id} declares size {} but has {} categories",
                        sizes[axis],
                        codes.len()
                    )));
                }
            }
            let categories = codes
                .into_iter()
                .map(|code| {
                    let label = labels
                        .and_then(|l| l.get(&code))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    Category::new(code, label)
                })
                .collect();
            out.push(Dimension::new(id.clone(), categories));
        }
        finish(out)
    }

    /// Flatten into `dimension | code | label` lines, in axis then category order.
    pub fn describe(&self) -> Vec<CodeEntry> {
        self.iter()
            .flat_map(|d| {
                d.categories.iter().map(move |c| CodeEntry {
                    dimension: d.id.clone(),
                    code: c.code.clone(),
                    label: c.label.clone(),
                })
            })
            .collect()
    }
}

fn finish(dims: Vec<Dimension>) -> Result<DimensionSet> {
    let mut seen = std::collections::HashSet::new();
    for d in &dims {
        if d.id == VALUE_COLUMN {
            return Err(Error::malformed(format!(
                "dimension id {VALUE_COLUMN:?} collides with the value column"
            )));
        }
        if !seen.insert(d.id.as_str()) {
            return Err(Error::malformed(format!("dimension {} declared twice", d.id)));
        }
    }
    Ok(DimensionSet::from_ordered(dims))
}

fn sdmx_descriptors(v: &Value, section: &str) -> Result<Vec<Dimension>> {
    let arr = v.as_array().ok_or_else(|| {
        Error::malformed(format!("structure.dimensions.{section} is not an array"))
    })?;
    let mut out = Vec::with_capacity(arr.len());
    for d in arr {
        let id = d
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed(format!("{section} dimension without id")))?;
        let values = d.get("values").and_then(Value::as_array);
        let categories = values
            .map(|vals| vals.iter().map(sdmx_category).collect::<Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();
        out.push(Dimension::new(id, categories));
    }
    Ok(out)
}

fn sdmx_category(v: &Value) -> Result<Category> {
    let code = v
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::malformed(format!("dimension value without id: {v}")))?;
    let label = v
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| v.get("names").and_then(localized));
    Ok(Category::new(code, label))
}

/// Pick a label out of an SDMX `names` language map, English first.
fn localized(names: &Value) -> Option<String> {
    let map = names.as_object()?;
    map.get("en")
        .or_else(|| map.values().next())
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Invert `category.index` into codes ordered by position.
fn reverse_index(
    dim: &str,
    index: Option<&Value>,
    labels: Option<&Map<String, Value>>,
) -> Result<Vec<String>> {
    match index {
        Some(Value::Array(codes)) => codes
            .iter()
            .map(|c| {
                c.as_str().map(str::to_string).ok_or_else(|| {
                    Error::malformed(format!("dimension {dim}: non-string code {c}"))
                })
            })
            .collect(),
        Some(Value::Object(map)) => {
            let mut table: Vec<Option<String>> = vec![None; map.len()];
            for (code, pos) in map {
                let pos = pos.as_u64().ok_or_else(|| {
                    Error::malformed(format!("dimension {dim}: position of {code} is {pos}"))
                })? as usize;
                let slot = table.get_mut(pos).ok_or_else(|| {
                    Error::malformed(format!(
                        "dimension {dim}: position {pos} of {code} exceeds {} categories",
                        map.len()
                    ))
                })?;
                if slot.is_some() {
                    return Err(Error::malformed(format!(
                        "dimension {dim}: position {pos} assigned twice"
                    )));
                }
                *slot = Some(code.clone());
            }
            // With as many slots as codes and no duplicates, every slot is filled.
            Ok(table.into_iter().flatten().collect())
        }
        Some(other) => Err(Error::malformed(format!(
            "dimension {dim}: category.index is {other}"
        ))),
        // Single-category dimensions may omit the index.
        None => match labels {
            Some(l) if l.len() == 1 => Ok(l.keys().cloned().collect()),
            _ => Err(Error::missing_metadata(format!(
                "dimension.{dim}.category.index"
            ))),
        },
    }
}

fn string_array(v: &Value, what: &str) -> Result<Vec<String>> {
    v.as_array()
        .ok_or_else(|| Error::malformed(format!("{what} is not an array")))?
        .iter()
        .map(|x| {
            x.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::malformed(format!("{what} contains {x}")))
        })
        .collect()
}

fn usize_array(v: &Value, what: &str) -> Result<Vec<usize>> {
    v.as_array()
        .ok_or_else(|| Error::malformed(format!("{what} is not an array")))?
        .iter()
        .map(|x| {
            x.as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| Error::malformed(format!("{what} contains {x}")))
        })
        .collect()
}
