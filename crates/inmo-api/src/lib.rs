//! Backend communication for inmo
//!
//! The reasoning backend is a black-box HTTP service. This crate hides it
//! behind the [`ChatBackend`] trait so the session controller can be driven by
//! the real [`HttpBackend`] or by an in-memory fake.

use async_trait::async_trait;
use inmo_types::{ChatReply, ErrorKind};
use thiserror::Error;

pub mod config;
mod http;

pub use config::{resolve_base_url, DEFAULT_LOCAL_URL, HOSTED_BACKEND_URL, HOSTED_PREVIEW_DOMAIN};
pub use http::HttpBackend;

/// Failures talking to the backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed backend reply: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// Every chat failure is reported to the user the same way
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ConnectionFailure
    }
}

/// Backend trait - the two endpoints the client runtime depends on
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one user turn and wait for the assistant's reply
    async fn chat(&self, session_id: &str, text: &str) -> Result<ChatReply, BackendError>;

    /// Ask the backend to drop server-side state for a session
    async fn release_session(&self, session_id: &str) -> Result<(), BackendError>;

    /// Backend name for debugging
    fn backend_name(&self) -> &str;
}
