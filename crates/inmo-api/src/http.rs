use std::time::Duration;

use async_trait::async_trait;
use inmo_types::{ChatReply, ChatRequest};

use crate::{BackendError, ChatBackend};

/// reqwest-backed client for the INMO backend
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a client without a request timeout; a hung backend keeps the
    /// request pending until the transport gives up
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests fail after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: trim_base_url(base_url.into()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }

    fn session_url(&self, session_id: &str) -> String {
        format!("{}/sesion/{}", self.base_url, session_id)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat(&self, session_id: &str, text: &str) -> Result<ChatReply, BackendError> {
        let url = self.chat_url();
        let request = ChatRequest {
            mensaje: text,
            session_id,
        };

        log::debug!("POST {} ({} bytes, session {})", url, text.len(), session_id);

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Chat request failed: {} - {}", status, body);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response.text().await?;
        let reply: ChatReply = serde_json::from_str(&response_text)?;

        log::debug!(
            "Chat reply: {} chars, {} listing records",
            reply.respuesta.len(),
            reply.propiedades.len()
        );

        Ok(reply)
    }

    async fn release_session(&self, session_id: &str) -> Result<(), BackendError> {
        let url = self.session_url(session_id);
        log::debug!("DELETE {}", url);

        let response = self.client.delete(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "http"
    }
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let backend = HttpBackend::new("http://localhost:8000/");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.chat_url(), "http://localhost:8000/chat");
        assert_eq!(
            backend.session_url("session_17"),
            "http://localhost:8000/sesion/session_17"
        );
    }
}
