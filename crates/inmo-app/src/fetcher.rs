use std::time::Duration;

use async_trait::async_trait;
use inmo_results::{ImageError, ImageFetcher};

/// Fetches listing photos over HTTP; only an `image/*` body counts as loaded
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, src: &str) -> Result<(), ImageError> {
        let response = self
            .client
            .get(src)
            .send()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Fetch(format!("{} returned {}", src, status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(ImageError::Decode(format!("unexpected content type '{}'", content_type)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;
        if body.is_empty() {
            return Err(ImageError::Decode("empty body".to_string()));
        }

        log::debug!("Loaded image {} ({} bytes)", src, body.len());
        Ok(())
    }
}
