//! Session controller: transcript, pending flag and reset
//!
//! Every asynchronous completion captures the session generation it was issued
//! under and is dropped when a reset has moved the generation on in the
//! meantime.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use inmo_api::{BackendError, ChatBackend};
use inmo_results::dedupe;
use inmo_types::{
    ChatReply, ErrorKind, Message, GREETING_PROMPT, RESET_FAILURE_TEXT, SEND_FAILURE_TEXT,
    START_FAILURE_TEXT,
};
use tokio::sync::{broadcast, Mutex};

use crate::reply::clean_reply;

/// Buffered events per subscriber before the slowest one starts lagging
const EVENT_CAPACITY: usize = 64;

/// How long `reset` waits for the server to release the old session
pub const RELEASE_TIMEOUT: Duration = Duration::from_secs(3);

/// Client-generated session id, stable for the lifetime of the controller
pub fn new_session_id() -> String {
    format!("session_{}", Utc::now().timestamp_millis())
}

/// Observable changes of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A message was appended at this transcript index
    MessageAppended(usize),
    PendingChanged(bool),
    /// Input focus should return to the composer
    FocusComposer,
    /// The transcript was cleared
    Reset { generation: u64 },
}

/// Point-in-time copy of the session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub transcript: Vec<Message>,
    pub pending: bool,
    pub last_error: Option<ErrorKind>,
    pub generation: u64,
}

#[derive(Debug)]
struct SessionState {
    session_id: String,
    transcript: Vec<Message>,
    pending: bool,
    last_error: Option<ErrorKind>,
    generation: u64,
    started: bool,
}

/// What a completion appends on success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnKind {
    Greeting,
    Reply,
}

/// Owns the transcript and the single in-flight request of one session.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionController {
    backend: Arc<dyn ChatBackend>,
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
    release_timeout: Duration,
}

impl SessionController {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self::with_session_id(backend, new_session_id())
    }

    pub fn with_session_id(backend: Arc<dyn ChatBackend>, session_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            state: Arc::new(Mutex::new(SessionState {
                session_id: session_id.into(),
                transcript: Vec::new(),
                pending: false,
                last_error: None,
                generation: 0,
                started: false,
            })),
            events,
            release_timeout: RELEASE_TIMEOUT,
        }
    }

    /// Bound the wait on the server-side release during `reset`
    pub fn with_release_timeout(mut self, timeout: Duration) -> Self {
        self.release_timeout = timeout;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    /// Open the session with the greeting turn. Only the first call does
    /// anything; returns whether this call started the session.
    pub async fn start(&self) -> bool {
        let (generation, session_id) = {
            let mut state = self.state.lock().await;
            if state.started {
                log::debug!("Session {} already started", state.session_id);
                return false;
            }
            state.started = true;
            self.set_pending(&mut state, true);
            (state.generation, state.session_id.clone())
        };

        log::info!("Starting session {}", session_id);

        let outcome = self.backend.chat(&session_id, GREETING_PROMPT).await;
        self.complete(generation, outcome, TurnKind::Greeting, START_FAILURE_TEXT)
            .await;
        true
    }

    /// Send one user turn.
    ///
    /// Blank input and input arriving while a request is pending are
    /// rejected without touching the transcript or the network. Returns
    /// whether the turn was accepted.
    pub async fn send(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let (generation, session_id) = {
            let mut state = self.state.lock().await;
            if state.pending {
                log::debug!("Ignoring send while a request is pending");
                return false;
            }
            state.transcript.push(Message::user(text));
            let index = state.transcript.len() - 1;
            let _ = self.events.send(SessionEvent::MessageAppended(index));
            state.last_error = None;
            self.set_pending(&mut state, true);
            (state.generation, state.session_id.clone())
        };

        let outcome = self.backend.chat(&session_id, text).await;
        if self
            .complete(generation, outcome, TurnKind::Reply, SEND_FAILURE_TEXT)
            .await
        {
            let _ = self.events.send(SessionEvent::FocusComposer);
        }
        true
    }

    /// Drop server-side state, clear the transcript and replay the greeting.
    ///
    /// The session id is kept. The release is awaited for at most the
    /// release timeout; failing or expiring it is a swallowed reset failure.
    /// Any request still in flight belongs to the previous generation and is
    /// discarded when it resolves.
    pub async fn reset(&self) {
        let session_id = self.session_id().await;

        let release = self.backend.release_session(&session_id);
        match tokio::time::timeout(self.release_timeout, release).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::debug!("{} for {}: {}", ErrorKind::ResetFailure, session_id, e),
            Err(_) => log::debug!(
                "{} for {}: no answer within {:?}",
                ErrorKind::ResetFailure,
                session_id,
                self.release_timeout
            ),
        }

        let generation = {
            let mut state = self.state.lock().await;
            state.transcript.clear();
            state.last_error = None;
            state.generation += 1;
            state.started = true;
            let _ = self.events.send(SessionEvent::Reset {
                generation: state.generation,
            });
            self.set_pending(&mut state, true);
            state.generation
        };

        log::info!("Session {} reset (generation {})", session_id, generation);

        let outcome = self.backend.chat(&session_id, GREETING_PROMPT).await;
        self.complete(generation, outcome, TurnKind::Greeting, RESET_FAILURE_TEXT)
            .await;
    }

    /// Apply a finished request. Returns `false` when the result was stale.
    async fn complete(
        &self,
        generation: u64,
        outcome: Result<ChatReply, BackendError>,
        kind: TurnKind,
        failure_text: &str,
    ) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            log::debug!(
                "Discarding response from generation {} (current {})",
                generation,
                state.generation
            );
            return false;
        }

        let message = match outcome {
            Ok(reply) => {
                let text = clean_reply(&reply.respuesta);
                match kind {
                    TurnKind::Greeting => Message::assistant(text),
                    TurnKind::Reply => Message::assistant_with_listings(text, dedupe(reply.listings())),
                }
            }
            Err(e) => {
                log::warn!("{} in session {}: {}", e.kind(), state.session_id, e);
                state.last_error = Some(e.kind());
                Message::assistant(failure_text)
            }
        };

        state.transcript.push(message);
        let index = state.transcript.len() - 1;
        let _ = self.events.send(SessionEvent::MessageAppended(index));
        self.set_pending(&mut state, false);
        true
    }

    fn set_pending(&self, state: &mut SessionState, pending: bool) {
        state.pending = pending;
        let _ = self.events.send(SessionEvent::PendingChanged(pending));
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.state.lock().await.transcript.clone()
    }

    /// The most recent message, if any
    pub async fn last_message(&self) -> Option<Message> {
        self.state.lock().await.transcript.last().cloned()
    }

    pub async fn message(&self, index: usize) -> Option<Message> {
        self.state.lock().await.transcript.get(index).cloned()
    }

    pub async fn pending(&self) -> bool {
        self.state.lock().await.pending
    }

    pub async fn last_error(&self) -> Option<ErrorKind> {
        self.state.lock().await.last_error
    }

    pub async fn session_id(&self) -> String {
        self.state.lock().await.session_id.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            session_id: state.session_id.clone(),
            transcript: state.transcript.clone(),
            pending: state.pending,
            last_error: state.last_error,
            generation: state.generation,
        }
    }
}
