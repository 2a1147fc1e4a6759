//! Panel Assembler: tidy tables -> one wide country/month table.
//!
//! A [`Series`] is one named value column extracted from a decoded table, keyed by
//! `(country, month)` (or by month alone for global series such as US rates). A
//! [`Panel`] starts from one series and joins further series onto it.

use crate::error::{Error, Result};
use crate::models::{PERIOD_COLUMN, Row, TidyTable};
use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

fn month_key(year: i32, month: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.format("%Y-%m").to_string())
}

fn period_regexes() -> &'static [(Regex, PeriodKind); 4] {
    static RES: OnceLock<[(Regex, PeriodKind); 4]> = OnceLock::new();
    RES.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid period pattern");
        [
            (re(r"^(\d{4})$"), PeriodKind::Year),
            (re(r"^(\d{4})-?M(\d{1,2})$"), PeriodKind::Month),
            (re(r"^(\d{4})-(\d{1,2})$"), PeriodKind::Month),
            (re(r"^(\d{4})-?Q([1-4])$"), PeriodKind::Quarter),
        ]
    })
}

#[derive(Debug, Clone, Copy)]
enum PeriodKind {
    Year,
    Month,
    Quarter,
}

/// Normalize a period label to the `YYYY-MM` months it covers.
///
/// Monthly (`2020-01`, `2020M01`) and daily (`2020-01-15`) periods give one month,
/// quarters (`2020-Q1`) three, and years (`2020`) twelve. Anything else gives none.
pub fn to_months(period: &str) -> Vec<String> {
    let p = period.trim();
    for (re, kind) in period_regexes() {
        let Some(caps) = re.captures(p) else {
            continue;
        };
        let Ok(year) = caps[1].parse::<i32>() else {
            return Vec::new();
        };
        let months: Vec<u32> = match kind {
            PeriodKind::Year => (1..=12).collect(),
            PeriodKind::Month => caps[2].parse::<u32>().map(|m| vec![m]).unwrap_or_default(),
            PeriodKind::Quarter => caps[2]
                .parse::<u32>()
                .map(|q| (q * 3 - 2..=q * 3).collect())
                .unwrap_or_default(),
        };
        return months.into_iter().filter_map(|m| month_key(year, m)).collect();
    }
    // Dates, optionally followed by a time part.
    let date_part = p.get(..10).unwrap_or(p);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| vec![d.format("%Y-%m").to_string()])
        .unwrap_or_default()
}

/// How to pull one [`Series`] out of a [`TidyTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesSpec {
    /// Column holding the country code; `None` for a global series.
    pub country_column: Option<String>,
    /// `(column, label)` pairs a row must match.
    pub filters: Vec<(String, String)>,
    /// `(column, candidates)`: keep only rows with the first candidate present.
    pub preference: Option<(String, Vec<String>)>,
}

impl SeriesSpec {
    pub fn by_country(column: impl Into<String>) -> Self {
        Self {
            country_column: Some(column.into()),
            ..Self::default()
        }
    }

    pub fn global() -> Self {
        Self::default()
    }

    pub fn filter(mut self, column: impl Into<String>, label: impl Into<String>) -> Self {
        self.filters.push((column.into(), label.into()));
        self
    }

    /// e.g. `prefer("s_adj", ["SCA", "SA", "NSA"])`.
    pub fn prefer<I, S>(mut self, column: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preference = Some((
            column.into(),
            candidates.into_iter().map(Into::into).collect(),
        ));
        self
    }

    fn matches(&self, row: &Row) -> bool {
        self.filters
            .iter()
            .all(|(col, want)| row.label(col) == Some(want.as_str()))
    }
}

/// Key of a panel row. `country` is `None` only for rows coming from global series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PanelKey {
    pub country: Option<String>,
    pub month: String,
}

/// One named value column keyed by `(country, month)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    global: bool,
    points: BTreeMap<PanelKey, f64>,
}

impl Series {
    /// Extract a series from `table`.
    ///
    /// Rows with a null value, an unparsable period, or (for country series) no
    /// country are skipped. Duplicate `(country, month)` keys keep the first value.
    ///
    /// ### Errors
    /// [`Error::Panel`] when `table` lacks the `period` column or the country column.
    pub fn from_table(table: &TidyTable, name: impl Into<String>, spec: &SeriesSpec) -> Result<Self> {
        let name = name.into();
        if !table.has_column(PERIOD_COLUMN) {
            return Err(Error::Panel(format!("{name}: table has no {PERIOD_COLUMN:?} column")));
        }
        if let Some(col) = &spec.country_column {
            if !table.has_column(col) {
                return Err(Error::Panel(format!("{name}: table has no {col:?} column")));
            }
        }

        let mut rows: Vec<&Row> = table.rows().iter().filter(|r| spec.matches(r)).collect();
        if let Some((col, candidates)) = &spec.preference {
            let present: BTreeSet<&str> = rows.iter().filter_map(|r| r.label(col)).collect();
            if let Some(chosen) = candidates.iter().find(|c| present.contains(c.as_str())) {
                rows.retain(|r| r.label(col) == Some(chosen.as_str()));
            }
        }

        let mut points = BTreeMap::new();
        let mut duplicates = 0usize;
        for row in rows {
            let Some(value) = row.value() else { continue };
            let Some(period) = row.label(PERIOD_COLUMN) else {
                continue;
            };
            let country = match &spec.country_column {
                Some(col) => match row.label(col) {
                    Some(c) => Some(c.trim().to_ascii_uppercase()),
                    None => continue,
                },
                None => None,
            };
            for month in to_months(period) {
                let key = PanelKey {
                    country: country.clone(),
                    month,
                };
                if points.contains_key(&key) {
                    duplicates += 1;
                } else {
                    points.insert(key, value);
                }
            }
        }
        if duplicates > 0 {
            debug!("{name}: dropped {duplicates} duplicate (country, month) points");
        }
        Ok(Self {
            name,
            global: spec.country_column.is_none(),
            points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, country: Option<&str>, month: &str) -> Option<f64> {
        self.points
            .get(&PanelKey {
                country: country.map(str::to_string),
                month: month.to_string(),
            })
            .copied()
    }

    fn lookup(&self, key: &PanelKey) -> Option<f64> {
        if self.global {
            self.get(None, &key.month)
        } else {
            self.points.get(key).copied()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keep the panel's keys only.
    Left,
    /// Also add keys that only the joined series has.
    Outer,
}

/// Wide table: one row per `(country, month)`, one column per merged series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    columns: Vec<String>,
    rows: BTreeMap<PanelKey, Vec<Option<f64>>>,
}

impl Panel {
    /// Start a panel whose keys are those of `base`.
    pub fn from_series(base: &Series) -> Self {
        let rows = base
            .points
            .iter()
            .map(|(k, v)| (k.clone(), vec![Some(*v)]))
            .collect();
        Self {
            columns: vec![base.name.clone()],
            rows,
        }
    }

    /// Join `series` as a new column. Global series join on month only.
    pub fn merge(&mut self, series: &Series, how: JoinKind) -> Result<()> {
        if self.columns.iter().any(|c| c == series.name()) {
            return Err(Error::Panel(format!("column {:?} already in panel", series.name())));
        }
        for (key, values) in self.rows.iter_mut() {
            values.push(series.lookup(key));
        }
        if how == JoinKind::Outer {
            let width = self.columns.len();
            let months: BTreeSet<&str> = self.rows.keys().map(|k| k.month.as_str()).collect();
            let mut extra = Vec::new();
            for (key, v) in &series.points {
                let missing = if series.global {
                    !months.contains(key.month.as_str())
                } else {
                    !self.rows.contains_key(key)
                };
                if missing {
                    let mut values = vec![None; width];
                    values.push(Some(*v));
                    extra.push((key.clone(), values));
                }
            }
            self.rows.extend(extra);
        }
        self.columns.push(series.name.clone());
        Ok(())
    }

    /// Keep only rows whose country is in `countries` (global rows are kept).
    pub fn retain_countries(&mut self, countries: &[&str]) {
        let wanted: BTreeSet<String> = countries
            .iter()
            .map(|c| c.trim().to_ascii_uppercase())
            .collect();
        self.rows.retain(|k, _| match &k.country {
            Some(c) => wanted.contains(c),
            None => true,
        });
    }

    /// Keep months in `start..=end` (`YYYY-MM`).
    pub fn window(&mut self, start: &str, end: &str) {
        self.rows
            .retain(|k, _| k.month.as_str() >= start && k.month.as_str() <= end);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows sorted by `(country, month)`.
    pub fn rows(&self) -> impl Iterator<Item = (&PanelKey, &[Option<f64>])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn get(&self, country: Option<&str>, month: &str, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        let key = PanelKey {
            country: country.map(str::to_string),
            month: month.to_string(),
        };
        self.rows.get(&key).and_then(|v| v[idx])
    }
}
