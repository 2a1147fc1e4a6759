//! Synchronous retrieval client for statistical data APIs.
//!
//! The client fetches a payload for a fully-qualified request identity (URL), serving
//! it from the disk cache when possible and retrying transient failures (network errors
//! and 5xx) with geometric backoff. Anything else fails on the first attempt.
//!
//! ### Notes
//! - `use_cache: None` means "cache iff a cache directory is configured".
//! - A corrupt or truncated cache entry is logged and treated as a miss.
//! - A cache write failure is logged; the fetched payload is still returned.
//!
//! Typical usage:
//! ```no_run
//! # use macropanel_rs::{Client, ClientConfig};
//! let client = Client::new(ClientConfig::default().with_cache_dir(".cache/eurostat"))?;
//! let table = client.fetch_table(
//!     "https://ec.europa.eu/eurostat/api/discover/sdmx?table=STS_RT_M&format=JSON&geo=DE",
//!     None,
//! )?;
//! println!("{} rows", table.len());
//! # Ok::<(), macropanel_rs::Error>(())
//! ```

use crate::cache::DiskCache;
use crate::config::ClientConfig;
use crate::csv_decode::{CsvLayout, decode_csv};
use crate::decode::Dataset;
use crate::error::{Error, Result};
use crate::models::TidyTable;
use crate::payload::{Payload, PayloadFormat};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::transport::{HttpTransport, Transport};
use log::{info, warn};

#[derive(Debug)]
pub struct Client<T: Transport = HttpTransport, S: Sleeper = ThreadSleeper> {
    config: ClientConfig,
    retry: RetryPolicy,
    cache: Option<DiskCache>,
    transport: T,
    sleeper: S,
}

impl Client {
    /// Client on top of `reqwest::blocking`, configured from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Client::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    /// Client on top of any [`Transport`].
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let cache = config.cache_dir.as_ref().map(DiskCache::open).transpose()?;
        Ok(Self {
            retry: RetryPolicy::from(&config),
            config,
            cache,
            transport,
            sleeper: ThreadSleeper,
        })
    }
}

impl<T: Transport, S: Sleeper> Client<T, S> {
    /// Replace the backoff sleeper.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Client<T, S2> {
        Client {
            config: self.config,
            retry: self.retry,
            cache: self.cache,
            transport: self.transport,
            sleeper,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&DiskCache> {
        self.cache.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Fetch an SDMX-JSON or JSON-stat dataset.
    pub fn fetch(&self, identity: &str, use_cache: Option<bool>) -> Result<Payload> {
        self.fetch_with(identity, PayloadFormat::Dataset, use_cache)
    }

    /// Fetch `identity` expecting `format`.
    ///
    /// ### Arguments
    /// - `identity`: fully-qualified request URL; also the cache key.
    /// - `format`: expected body format, checked before the body is cached.
    /// - `use_cache`: `None` follows the configuration, `Some(false)` bypasses the cache,
    ///   `Some(true)` requires one.
    ///
    /// ### Errors
    /// - [`Error::CacheNotConfigured`] for `use_cache = Some(true)` without a cache dir.
    /// - [`Error::PermanentClient`] for non-2xx, non-5xx responses.
    /// - [`Error::MalformedPayload`] when a 2xx body is not a valid `format` document.
    /// - [`Error::RetriesExhausted`] when every attempt failed transiently.
    pub fn fetch_with(
        &self,
        identity: &str,
        format: PayloadFormat,
        use_cache: Option<bool>,
    ) -> Result<Payload> {
        let cache = match use_cache {
            Some(true) => Some(self.cache.as_ref().ok_or(Error::CacheNotConfigured)?),
            Some(false) => None,
            None => self.cache.as_ref(),
        };

        if let Some(cache) = cache {
            match cache.read(identity, format) {
                Ok(Some(payload)) => {
                    info!("Cache hit for URL: {identity}");
                    return Ok(payload);
                }
                Ok(None) => {}
                Err(e) => warn!("{e}; treating as cache miss"),
            }
        }

        info!("Fetching URL: {identity}");
        let (payload, body) = self.retry.run(&self.sleeper, |_attempt| {
            let resp = self.transport.get(identity)?;
            if !resp.is_success() {
                return Err(Error::from_status(resp.status, &resp.text_lossy()));
            }
            let payload = Payload::parse(&resp.body, format)?;
            Ok((payload, resp.body))
        })?;

        if let Some(cache) = cache {
            if let Err(e) = cache.write(identity, format, &body) {
                warn!("{e}");
            }
        }
        Ok(payload)
    }

    /// Fetch and index a JSON dataset without decoding it.
    pub fn fetch_dataset(&self, identity: &str, use_cache: Option<bool>) -> Result<Dataset> {
        let payload = self.fetch(identity, use_cache)?;
        Dataset::from_payload(&payload)
    }

    /// Fetch and decode a JSON dataset into a tidy table.
    pub fn fetch_table(&self, identity: &str, use_cache: Option<bool>) -> Result<TidyTable> {
        self.fetch_dataset(identity, use_cache)?.decode()
    }

    /// Fetch and decode a CSV dataset.
    pub fn fetch_csv_table(
        &self,
        identity: &str,
        layout: &CsvLayout,
        use_cache: Option<bool>,
    ) -> Result<TidyTable> {
        let text = self
            .fetch_with(identity, PayloadFormat::Csv, use_cache)?
            .into_text()?;
        decode_csv(&text, layout)
    }
}
