use super::ObjectStore;
use crate::models::BlobSettings;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

/// HTTP blob API in the style of Vercel Blob: `PUT {api}/{pathname}` with a
/// bearer token, answering with the public URL of the stored object.
pub struct BlobStore {
    client: reqwest::Client,
    token: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct PutBlobResponse {
    url: String,
}

impl BlobStore {
    pub fn new(settings: &BlobSettings) -> Self {
        Self::new_with_client(settings, reqwest::Client::new())
    }

    pub fn new_with_client(settings: &BlobSettings, client: reqwest::Client) -> Self {
        Self {
            client,
            token: settings.token.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for BlobStore {
    async fn put(&self, name: &str, data: &[u8], content_type: &str) -> Result<String> {
        let endpoint = format!("{}/{}", self.api_url, name);
        debug!("Uploading {} bytes to {}", data.len(), endpoint);

        let response = self
            .client
            .put(&endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, content_type)
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .body(data.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(format!(
                "Blob API rejected upload of {} with status {}: {}",
                name, status, body
            )));
        }

        let stored: PutBlobResponse = response.json().await?;
        Ok(stored.url)
    }
}
