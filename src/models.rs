//! Core data types shared by the index, the decoders and the panel assembler.
//!
//! A [`DimensionSet`] describes the axes of a dataset; a [`TidyTable`] is what every
//! decoder returns: one [`Row`] per observation, dimension columns in axis order
//! followed by [`VALUE_COLUMN`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Reserved column holding the observation value.
pub const VALUE_COLUMN: &str = "value";

/// Canonical name of the time column in every decoded table.
pub const PERIOD_COLUMN: &str = "period";

/// Provider spellings of the time dimension, renamed to [`PERIOD_COLUMN`].
pub const TIME_DIMENSION_ALIASES: &[&str] = &["TIME_PERIOD", "time", "TIME"];

/// One position along a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub code: String,
    pub label: Option<String>,
}

impl Category {
    pub fn new(code: impl Into<String>, label: Option<String>) -> Self {
        Self {
            code: code.into(),
            label,
        }
    }

    /// Label, or the code when the label is absent or blank.
    pub fn display(&self) -> &str {
        match &self.label {
            Some(l) if !l.trim().is_empty() => l,
            _ => &self.code,
        }
    }
}

/// A dimension and its categories in index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub id: String,
    pub categories: Vec<Category>,
}

impl Dimension {
    pub fn new(id: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            id: id.into(),
            categories,
        }
    }

    pub fn size(&self) -> usize {
        self.categories.len()
    }

    pub fn category(&self, pos: usize) -> Option<&Category> {
        self.categories.get(pos)
    }
}

/// All dimensions of a dataset plus the axis order used by observation keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionSet {
    order: Vec<String>,
    dimensions: HashMap<String, Dimension>,
}

impl DimensionSet {
    /// Build from dimensions in axis order. Later duplicates replace earlier ones.
    pub fn from_ordered(dims: Vec<Dimension>) -> Self {
        let mut set = DimensionSet::default();
        for d in dims {
            if set.dimensions.contains_key(&d.id) {
                set.order.retain(|id| id != &d.id);
            }
            set.order.push(d.id.clone());
            set.dimensions.insert(d.id.clone(), d);
        }
        set
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Dimension> {
        self.dimensions.get(id)
    }

    /// Dimensions in axis order.
    pub fn iter(&self) -> impl Iterator<Item = &Dimension> {
        self.order.iter().filter_map(|id| self.dimensions.get(id))
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.iter().map(Dimension::size).collect()
    }

    /// Product of all dimension sizes; `None` if it overflows `usize`.
    pub fn address_space(&self) -> Option<usize> {
        self.iter().try_fold(1usize, |acc, d| acc.checked_mul(d.size()))
    }
}

/// A decoded cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Label(String),
    Null,
}

impl Cell {
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Cell::Label(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::Number).unwrap_or(Cell::Null)
    }
}

/// One observation: dimension id -> label, plus [`VALUE_COLUMN`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Cell>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, cell: Cell) {
        self.0.insert(column.into(), cell);
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.0.get(column)
    }

    pub fn label(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Cell::as_label)
    }

    /// Observation value; `None` when the observation carried no value.
    pub fn value(&self) -> Option<f64> {
        self.get(VALUE_COLUMN).and_then(Cell::as_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Cell)> {
        self.0.iter()
    }

    fn rename(&mut self, from: &str, to: &str) {
        if let Some(cell) = self.0.remove(from) {
            self.0.insert(to.to_string(), cell);
        }
    }
}

/// Tidy result of one decode: one row per observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TidyTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl TidyTable {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rename the first time-dimension alias present to [`PERIOD_COLUMN`].
    ///
    /// ### Errors
    /// [`Error::MalformedPayload`] when the table already has a `period` column next to
    /// the alias; renaming would overwrite it.
    pub(crate) fn normalize_time_column(mut self) -> Result<Self> {
        let alias = TIME_DIMENSION_ALIASES
            .iter()
            .find(|a| self.has_column(a))
            .copied();
        if let Some(from) = alias {
            if self.has_column(PERIOD_COLUMN) {
                return Err(Error::malformed(format!(
                    "time dimension {from:?} clashes with an existing {PERIOD_COLUMN:?} dimension"
                )));
            }
            for c in self.columns.iter_mut() {
                if c == from {
                    *c = PERIOD_COLUMN.to_string();
                }
            }
            for row in self.rows.iter_mut() {
                row.rename(from, PERIOD_COLUMN);
            }
        }
        Ok(self)
    }
}
