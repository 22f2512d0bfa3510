use crate::config::ApiConfig;
use crate::errors::{Error, FetchError, Result};
use crate::metrics::FETCH_FAILURES_TOTAL;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Source of raw JSON payloads for named endpoints.
///
/// Implementations never fail loudly: any transport, status or decoding
/// problem is logged and reported as `None`, meaning "no data this cycle".
pub trait DataSource: Send + Sync {
    fn fetch(&self, endpoint: &str) -> impl Future<Output = Option<Value>> + Send;
}

/// `DataSource` backed by the telemetry REST API.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| Error::Config(format!("API key is not a valid header value: {}", e)))?;
        headers.insert(API_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    async fn request(&self, endpoint: &str) -> std::result::Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.json::<Value>().await?)
    }
}

impl DataSource for HttpFetcher {
    async fn fetch(&self, endpoint: &str) -> Option<Value> {
        match self.request(endpoint).await {
            Ok(value) => {
                debug!("Fetched {}", endpoint);
                Some(value)
            }
            Err(e) => {
                warn!("Error fetching data from {}: {}", endpoint, e);
                FETCH_FAILURES_TOTAL.inc();
                None
            }
        }
    }
}

#[cfg(test)]
pub use fixture::FixtureSource;
