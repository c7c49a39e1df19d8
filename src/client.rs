use crate::record::{Bird, BirdWithSeenStatus, RemovalResponse, Sighting, SightingRequest};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use rand::Rng;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with HTTP {0}")]
    Status(u16),
}

/// The catalog operations the view state needs from the server.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn birds(&self, user_id: Option<u64>) -> Result<Vec<BirdWithSeenStatus>, ClientError>;

    /// `Ok(None)` when the server has no such bird.
    async fn bird(&self, id: u64) -> Result<Option<Bird>, ClientError>;

    async fn add_sighting(&self, user_id: u64, bird_id: u64) -> Result<Sighting, ClientError>;

    async fn remove_sighting(&self, user_id: u64, bird_id: u64) -> Result<bool, ClientError>;
}

pub struct CatalogClient {
    client: Client,
    base_url: String,
    pub(crate) base_delay: Duration,
    pub(crate) max_retries: u32,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("aviary/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            base_delay: Duration::from_millis(500),
            max_retries: 3,
        })
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.base_delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exponential backoff with up to one base delay of jitter.
    pub(crate) fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let jitter = if base_ms > 0 {
            rand::rng().random_range(0..base_ms)
        } else {
            0
        };
        let backoff = 2_u64.saturating_pow(attempt).saturating_mul(base_ms);
        Duration::from_millis(backoff.saturating_add(jitter))
    }

    /// Sends a request, retrying rate limits, server errors and transport
    /// failures. Every call in the catalog API is idempotent, so retrying a
    /// mutation is safe.
    async fn send_with_retry(
        &self,
        what: &str,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, ClientError> {
        let mut attempt = 0;
        loop {
            let outcome = build().send().await;
            let retryable = match &outcome {
                Ok(response) => {
                    response.status() == StatusCode::TOO_MANY_REQUESTS
                        || response.status().is_server_error()
                }
                Err(_) => true,
            };

            if !retryable {
                return outcome.map_err(ClientError::from);
            }

            if attempt >= self.max_retries {
                error!("{} failed, max retries reached", what);
                return match outcome {
                    Ok(response) => Ok(response),
                    Err(e) => Err(e.into()),
                };
            }

            attempt += 1;
            let delay = self.backoff_delay(attempt);
            match &outcome {
                Ok(response) => warn!("HTTP {} for {}, retrying...", response.status(), what),
                Err(e) => warn!("Request failed for {}, retrying...: {}", what, e),
            }
            info!(
                "Retrying {} (attempt {}) after {}ms delay",
                what,
                attempt + 1,
                delay.as_millis()
            );
            sleep(delay).await;
        }
    }
}

fn ensure_success(response: Response) -> Result<Response, ClientError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status(response.status().as_u16()))
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn birds(&self, user_id: Option<u64>) -> Result<Vec<BirdWithSeenStatus>, ClientError> {
        let url = match user_id {
            Some(user_id) => self.url(&format!("/api/birds?userId={user_id}")),
            None => self.url("/api/birds"),
        };

        let response = self
            .send_with_retry("bird list", || self.client.get(&url))
            .await?;
        let birds: Vec<BirdWithSeenStatus> = ensure_success(response)?.json().await?;
        debug!("Fetched {} birds", birds.len());
        Ok(birds)
    }

    async fn bird(&self, id: u64) -> Result<Option<Bird>, ClientError> {
        let url = self.url(&format!("/api/birds/{id}"));
        let what = format!("bird {id}");

        let response = self
            .send_with_retry(&what, || self.client.get(&url))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(ensure_success(response)?.json().await?))
    }

    async fn add_sighting(&self, user_id: u64, bird_id: u64) -> Result<Sighting, ClientError> {
        let url = self.url("/api/sightings");
        let body = SightingRequest { user_id, bird_id };
        let what = format!("sighting of bird {bird_id}");

        let response = self
            .send_with_retry(&what, || self.client.post(&url).json(&body))
            .await?;
        Ok(ensure_success(response)?.json().await?)
    }

    async fn remove_sighting(&self, user_id: u64, bird_id: u64) -> Result<bool, ClientError> {
        let url = self.url(&format!("/api/sightings/{user_id}/{bird_id}"));
        let what = format!("removal of bird {bird_id}");

        let response = self
            .send_with_retry(&what, || self.client.delete(&url))
            .await?;
        let removal: RemovalResponse = ensure_success(response)?.json().await?;
        Ok(removal.success)
    }
}
