use std::time::Duration;

use inmo_api::{BackendError, ChatBackend, HttpBackend};
use inmo_types::ErrorKind;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_chat_posts_message_and_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"mensaje": "Busco casa", "session_id": "session_1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "respuesta": "Tengo opciones",
            "filtros": {},
            "propiedades": [{"id": "A", "titulo": "Casa"}],
            "total_resultados": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let reply = backend.chat("session_1", "Busco casa").await.unwrap();

    assert_eq!(reply.respuesta, "Tengo opciones");
    let ids: Vec<String> = reply.listings().into_iter().map(|l| l.id).collect();
    assert_eq!(ids, vec!["A".to_string()]);
}

#[tokio::test]
async fn test_non_success_status_is_connection_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Error procesando mensaje"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend.chat("session_1", "hola").await.unwrap_err();

    match &err {
        BackendError::Status { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "Error procesando mensaje");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::ConnectionFailure);
}

#[tokio::test]
async fn test_malformed_reply_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend.chat("session_1", "hola").await.unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Nothing listens on port 9 (discard) in the test environment.
    let backend = HttpBackend::new("http://127.0.0.1:9");
    let err = backend.chat("session_1", "hola").await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"respuesta": "tarde"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::with_timeout(server.uri(), Duration::from_millis(50)).unwrap();
    let err = backend.chat("session_1", "hola").await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
}

#[tokio::test]
async fn test_release_session_deletes_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/sesion/session_9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mensaje": "Sesión reiniciada correctamente"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(format!("{}/", server.uri()));
    backend.release_session("session_9").await.unwrap();
}

#[tokio::test]
async fn test_release_session_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend.release_session("gone").await.unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 404, .. }));
}
