//! Decode CSV datasets (SDMX-CSV, ECB `csvdata`, FRED graph exports) into a
//! [`TidyTable`] with the same conventions as the JSON decoders: label columns, a
//! numeric `value` column, and the time column named `period`.

use crate::error::{Error, Result};
use crate::models::{Cell, PERIOD_COLUMN, Row, TidyTable, VALUE_COLUMN};
use csv::ReaderBuilder;

/// Which CSV columns carry the time and the observation value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvLayout {
    pub time_column: String,
    pub value_column: String,
}

impl CsvLayout {
    pub fn new(time_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            time_column: time_column.into(),
            value_column: value_column.into(),
        }
    }

    /// `TIME_PERIOD` / `OBS_VALUE`, as served by SDMX-CSV endpoints.
    pub fn sdmx() -> Self {
        Self::new("TIME_PERIOD", "OBS_VALUE")
    }
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self::sdmx()
    }
}

/// Decode CSV `text` laid out as `layout`.
///
/// Empty or non-numeric values (FRED writes `.` for gaps) become null.
///
/// ### Errors
/// - [`Error::MalformedPayload`] when `layout` names a column the header lacks.
/// - [`Error::Csv`] for ragged rows or unreadable input.
pub fn decode_csv(text: &str, layout: &CsvLayout) -> Result<TidyTable> {
    let mut rdr = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let find = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::malformed(format!("CSV is missing column {name:?}; columns={headers:?}"))
        })
    };
    let time_idx = find(&layout.time_column)?;
    let value_idx = find(&layout.value_column)?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == time_idx {
                PERIOD_COLUMN.to_string()
            } else if i == value_idx {
                VALUE_COLUMN.to_string()
            } else {
                h.clone()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut row = Row::new();
        for (i, field) in record.iter().enumerate() {
            let cell = if i == value_idx {
                Cell::from(field.parse::<f64>().ok().filter(|v| v.is_finite()))
            } else if field.is_empty() {
                Cell::Null
            } else {
                Cell::Label(field.to_string())
            };
            row.insert(columns[i].clone(), cell);
        }
        rows.push(row);
    }
    Ok(TidyTable::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fred_gaps_are_null() {
        let text = "observation_date,UNRATE\n2020-01-01,3.5\n2020-02-01,.\n";
        let t = decode_csv(text, &CsvLayout::new("observation_date", "UNRATE")).unwrap();
        assert_eq!(t.columns(), ["period", "value"]);
        assert_eq!(t.rows()[0].value(), Some(3.5));
        assert!(t.rows()[1].get("value").unwrap().is_null());
    }
}
