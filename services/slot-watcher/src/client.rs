//! HTTP client for the availability API
//!
//! One GET per poll cycle, with the active API key in the `x-api-key` header
//! alongside a static set of browser-like headers the upstream expects. The
//! response envelope is `{"slotDetails": [...]}`; a missing field means "no
//! results", not an error. Non-2xx statuses are classified so the poll loop
//! can tell a rate limit (freeze the key) from a transient failure (retry
//! next cycle).

use std::time::Duration;

use chrono::NaiveDate;
use keypool::{UpstreamErrorKind, classify_status};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Deserializer};

/// One raw availability record from the upstream API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SlotRecord {
    #[serde(rename = "visa_location")]
    pub location: String,
    #[serde(rename = "slots")]
    pub open_count: u32,
    /// Absent or unparseable dates come through as `None`; the filter treats
    /// that as a non-match when a date bound is configured
    #[serde(rename = "start_date", default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct SlotsResponse {
    #[serde(rename = "slotDetails", default)]
    slot_details: Vec<SlotRecord>,
}

/// Errors from a single fetch attempt.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("rate limited by upstream (429)")]
    RateLimited,

    #[error("upstream rejected the API key (status {0})")]
    Auth(u16),

    #[error("upstream returned status {0}")]
    Upstream(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the availability API.
///
/// Holds the reqwest client with its finite timeout and the static header
/// set. Use [`SlotClient::new`] for production; the endpoint is fully
/// configurable so tests point it at a mock server.
pub struct SlotClient {
    client: Client,
    endpoint: String,
}

/// Static headers sent with every request, mirroring the browser extension
/// the upstream serves.
fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("accept", HeaderValue::from_static("*/*"));
    headers.insert(
        "accept-language",
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert("cache-control", HeaderValue::from_static("no-cache"));
    headers.insert("extversion", HeaderValue::from_static("4.6.5.1"));
    headers.insert(
        "origin",
        HeaderValue::from_static("chrome-extension://beepaenfejnphdgnkmccjcfiieihhogl"),
    );
    headers.insert("pragma", HeaderValue::from_static("no-cache"));
    headers.insert("priority", HeaderValue::from_static("u=1, i"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("cross-site"));
    headers.insert(
        "user-agent",
        HeaderValue::from_static(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/18.5 Safari/605.1.15",
        ),
    );
    headers
}

impl SlotClient {
    /// Build a client for the given endpoint with an explicit request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .default_headers(base_headers())
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
        })
    }

    /// Fetch the current availability records using `api_key`.
    ///
    /// A 429 maps to [`FetchError::RateLimited`] so the caller can freeze the
    /// key; 401/403 map to [`FetchError::Auth`]. A 200 with no `slotDetails`
    /// field is an empty result set.
    pub async fn fetch_slots(&self, api_key: &str) -> Result<Vec<SlotRecord>, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("x-api-key", api_key)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(match classify_status(status) {
                UpstreamErrorKind::RateLimited => FetchError::RateLimited,
                UpstreamErrorKind::Auth => FetchError::Auth(status),
                UpstreamErrorKind::Transient => FetchError::Upstream(status),
            });
        }

        let body = response.text().await?;
        let parsed: SlotsResponse = serde_json::from_str(&body)?;
        Ok(parsed.slot_details)
    }
}

/// Deserialize an optional date string, mapping empty or unparseable values
/// to `None` instead of failing the whole response.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}
