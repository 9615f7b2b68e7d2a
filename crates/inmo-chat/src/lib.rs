//! Conversation management for inmo
//!
//! This crate owns the chat transcript and the request lifecycle of a single
//! session: the opening greeting, user turns, failure messages and reset.

pub mod reply;
pub mod session;

pub use reply::clean_reply;
pub use session::{new_session_id, SessionController, SessionEvent, SessionSnapshot, RELEASE_TIMEOUT};
