//! macropanel_rs
//!
//! Retrieve multidimensional statistics from SDMX-JSON, JSON-stat and SDMX-CSV APIs
//! (Eurostat, ECB, FRED and friends) and turn them into tidy tables and
//! country/month panels. Pairs with the `macropanel` CLI.
//!
//! ### Features
//! - Blocking HTTP retrieval with retry/backoff on transient failures
//! - Disk cache keyed by the SHA-1 of the request URL
//! - One decoding engine for composite-key (SDMX) and flat-index (JSON-stat) datasets
//! - Time column normalized to `period` across providers
//! - Left/outer joins of decoded series into a monthly panel
//!
//! ### Example
//! ```no_run
//! use macropanel_rs::{Client, ClientConfig, JoinKind, Panel, Series, SeriesSpec};
//!
//! let client = Client::new(ClientConfig::default().with_cache_dir(".cache/macro"))?;
//! let hicp = client.fetch_dataset(
//!     "https://ec.europa.eu/eurostat/api/dissemination/statistics/1.0/data/prc_hicp_midx?geo=DE&geo=FR&coicop=CP00&unit=I15",
//!     None,
//! )?;
//! let table = hicp.decode_with(macropanel_rs::LabelMode::Code)?;
//! let series = Series::from_table(&table, "hicp_index", &SeriesSpec::by_country("geo"))?;
//! let mut panel = Panel::from_series(&series);
//! panel.window("2010-01", "2024-12");
//! macropanel_rs::storage::save_panel_csv(&panel, "macro_panel.csv")?;
//! # Ok::<(), macropanel_rs::Error>(())
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod csv_decode;
pub mod decode;
pub mod error;
pub mod index;
pub mod models;
pub mod observations;
pub mod panel;
pub mod payload;
pub mod request;
pub mod retry;
pub mod storage;
pub mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use csv_decode::{CsvLayout, decode_csv};
pub use decode::{Dataset, LabelMode, decode, decode_with};
pub use error::{Error, Result};
pub use index::CodeEntry;
pub use models::{Category, Cell, Dimension, DimensionSet, Row, TidyTable};
pub use observations::{IndexStyle, ObservationMap};
pub use panel::{JoinKind, Panel, PanelKey, Series, SeriesSpec, to_months};
pub use payload::{Payload, PayloadFormat};
pub use request::DatasetQuery;
pub use retry::{RetryPolicy, RetryState, Sleeper, ThreadSleeper};
pub use transport::{HttpTransport, RawResponse, Transport};
