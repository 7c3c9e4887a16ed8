//! Polling client for the air-quality sensor feed.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// An error that can occur when fetching a reading.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request could not be completed, or the endpoint answered with a
    /// non-success status.
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The response body was not the expected two-channel document.
    #[error("decode reading failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One reading produced by the sensor station, decoded from the feed
/// document.
///
/// The feed keys the channels as `field1` and `field2`; they carry the
/// MQ135 (air quality) and MQ3 (alcohol vapor) sensor values. Any other
/// keys in the document are ignored.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SensorReading {
    /// MQ135 channel value.
    #[serde(rename = "field1")]
    pub mq135: f64,
    /// MQ3 channel value.
    #[serde(rename = "field2")]
    pub mq3: f64,
}

/// HTTP client bound to the feed endpoint.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    url: String,
}

impl FeedClient {
    /// Timeout applied to every poll request, well under the poll period.
    const TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client polling `url`.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            url: url.into(),
        }
    }

    /// Fetch the current reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, times out, the endpoint
    /// answers with a non-success status, or the body cannot be decoded.
    pub async fn fetch(&self) -> Result<SensorReading, FeedError> {
        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(serde_json::from_str(&body)?)
    }
}
