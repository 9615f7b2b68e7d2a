#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use inmo_api::{BackendError, ChatBackend};
use inmo_chat::SessionEvent;
use inmo_types::{ChatReply, GREETING_PROMPT};
use serde_json::{json, Value};
use tokio::sync::{broadcast, oneshot};

pub type Outcome = Result<ChatReply, BackendError>;

/// One scripted answer of the fake backend
pub enum Scripted {
    Now(Outcome),
    /// Resolves when the test sends on the paired channel
    Later(oneshot::Receiver<Outcome>),
}

/// In-memory backend answering from per-kind queues
#[derive(Default)]
pub struct ScriptedBackend {
    greetings: Mutex<VecDeque<Scripted>>,
    turns: Mutex<VecDeque<Scripted>>,
    pub chats: Mutex<Vec<(String, String)>>,
    pub releases: Mutex<Vec<String>>,
    pub release_fails: bool,
    /// `release_session` never answers
    pub release_hangs: bool,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_release() -> Arc<Self> {
        Arc::new(Self {
            release_fails: true,
            ..Self::default()
        })
    }

    pub fn hanging_release() -> Arc<Self> {
        Arc::new(Self {
            release_hangs: true,
            ..Self::default()
        })
    }

    pub fn push_greeting(&self, step: Scripted) {
        self.greetings.lock().unwrap().push_back(step);
    }

    pub fn push_turn(&self, step: Scripted) {
        self.turns.lock().unwrap().push_back(step);
    }

    /// Queue a turn that resolves only when the returned sender fires
    pub fn push_slow_turn(&self) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.push_turn(Scripted::Later(rx));
        tx
    }

    pub fn chat_count(&self) -> usize {
        self.chats.lock().unwrap().len()
    }

    pub fn turn_texts(&self) -> Vec<String> {
        self.chats
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, text)| text != GREETING_PROMPT)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(&self, session_id: &str, text: &str) -> Result<ChatReply, BackendError> {
        self.chats
            .lock()
            .unwrap()
            .push((session_id.to_string(), text.to_string()));

        let queue = if text == GREETING_PROMPT {
            &self.greetings
        } else {
            &self.turns
        };
        let next = queue.lock().unwrap().pop_front();
        match next {
            None => Ok(reply("Hola, soy tu asistente", json!([]))),
            Some(Scripted::Now(outcome)) => outcome,
            Some(Scripted::Later(rx)) => rx.await.unwrap_or_else(|_| Err(status_error(599))),
        }
    }

    async fn release_session(&self, session_id: &str) -> Result<(), BackendError> {
        self.releases.lock().unwrap().push(session_id.to_string());
        if self.release_hangs {
            std::future::pending::<()>().await;
        }
        if self.release_fails {
            Err(status_error(404))
        } else {
            Ok(())
        }
    }

    fn backend_name(&self) -> &str {
        "scripted"
    }
}

pub fn reply(text: &str, propiedades: Value) -> ChatReply {
    serde_json::from_value(json!({ "respuesta": text, "propiedades": propiedades })).unwrap()
}

pub fn record(id: &str) -> Value {
    json!({
        "id": id,
        "titulo": format!("Casa {id}"),
        "precio_numerico": 150000,
        "moneda": "USD",
        "operacion": "venta",
        "ubicacion": "Asuncion",
        "coordenadas": {"latitud": -25.3, "longitud": -57.6},
        "imagenes": [{"url": format!("https://img/{id}.jpg"), "thumbnail": null}]
    })
}

pub fn status_error(status: u16) -> BackendError {
    BackendError::Status {
        status,
        body: "Error procesando mensaje".to_string(),
    }
}

/// Wait until `event` arrives, skipping everything before it
pub async fn wait_for(rx: &mut broadcast::Receiver<SessionEvent>, event: SessionEvent) {
    loop {
        match rx.recv().await {
            Ok(e) if e == event => return,
            Ok(_) => continue,
            Err(e) => panic!("event stream closed before {event:?}: {e}"),
        }
    }
}

/// Everything already queued on the receiver
pub fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}
