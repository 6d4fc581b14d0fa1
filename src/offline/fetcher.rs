use async_trait::async_trait;
use std::time::Duration;

use super::storage::CachedResponse;
use crate::api::ApiError;

/// Network side of the asset cache
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Request an absolute URL. Non-2xx answers are responses, not errors.
    async fn fetch(&self, method: &str, url: &str) -> Result<CachedResponse, ApiError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("g-trade-journal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, method: &str, url: &str) -> Result<CachedResponse, ApiError> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid method '{}': {}", method, e)))?;
        let response = self.client.request(method.clone(), url).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        log::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(CachedResponse {
            status,
            content_type,
            body,
        })
    }
}
