//! Network seam for the retrieval client.
//!
//! [`HttpTransport`] is the production implementation on top of `reqwest::blocking`.
//! Anything that can answer a GET with a status and a body can stand in for it.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub trait Transport {
    /// Perform one GET. Only transport-level failures are errors; any HTTP status,
    /// including 4xx/5xx, comes back as `Ok`.
    fn get(&self, url: &str) -> Result<RawResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<RawResponse> {
        (**self).get(url)
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &cfg.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("header value {value:?}: {e}")))?;
            headers.insert(name, value);
        }
        let http = HttpClient::builder()
            .timeout(cfg.timeout) // total request timeout
            .connect_timeout(cfg.connect_timeout)
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(cfg.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("reqwest client build: {e}")))?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<RawResponse> {
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|e| Error::TransientTransport(e.to_string()))?;
        let status = resp.status().as_u16();
        // A body cut off mid-stream is a transport failure, not a bad payload.
        let body = resp
            .bytes()
            .map_err(|e| Error::TransientTransport(e.to_string()))?;
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
