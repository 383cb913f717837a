//! Fetches blobs from a Syscoin PoDa endpoint.

use crate::GioError;

pub const DEFAULT_SYSCOIN_BASE_URL: &str = "https://poda.syscoin.org/vh";

#[derive(Debug, Clone)]
pub struct SyscoinClient {
    http: reqwest::Client,
    base_url: String,
}

impl SyscoinClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Returns the response body verbatim; only transport failures are
    /// errors.
    pub async fn fetch(&self, id: &str) -> Result<String, GioError> {
        tracing::debug!(id, "fetching syscoin poda blob");
        let response = self
            .http
            .get(format!("{}/{id}", self.base_url))
            .send()
            .await
            .map_err(GioError::upstream)?;
        response.text().await.map_err(GioError::upstream)
    }
}
