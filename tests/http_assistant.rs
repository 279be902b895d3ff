use openlaw_intake::llm::{Assistant, AssistantRequest, ContextMessage, HttpAssistant};
use openlaw_intake::{Config, RemoteErrorKind, SessionManager, TurnRole, TurnStatus};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn config_for(base_url: String) -> Config {
    Config {
        api_base_url: base_url,
        ..Config::default()
    }
}

fn form_fields(request: &Request) -> HashMap<String, String> {
    url::form_urlencoded::parse(&request.body)
        .into_owned()
        .collect()
}

async fn recorded_forms(server: &MockServer) -> Vec<HashMap<String, String>> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(form_fields)
        .collect()
}

async fn mount_reply(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_request_is_sent_as_search_form() {
    let server = MockServer::start().await;
    mount_reply(&server, 200, json!({"answer": "Where in Phoenix?", "chat_id": "c2"})).await;

    let assistant = HttpAssistant::new(&config_for(server.uri())).unwrap();
    let reply = assistant
        .reply(AssistantRequest {
            conversation_id: Some("c1".to_string()),
            context: vec![ContextMessage {
                role: TurnRole::User,
                text: "Need a lawyer".to_string(),
            }],
            text: "Phoenix".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(reply.text, "Where in Phoenix?");
    assert_eq!(reply.conversation_id.as_deref(), Some("c2"));

    let forms = recorded_forms(&server).await;
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["query"], "Phoenix");
    assert_eq!(forms[0]["chat_id"], "c1");
    let history: Value = serde_json::from_str(&forms[0]["history"]).unwrap();
    assert_eq!(history, json!([{"role": "user", "text": "Need a lawyer"}]));
}

#[tokio::test]
async fn test_first_request_has_no_chat_id() {
    let server = MockServer::start().await;
    mount_reply(&server, 200, json!({"answer": "Hi there!"})).await;

    let assistant = HttpAssistant::new(&config_for(server.uri())).unwrap();
    assistant
        .reply(AssistantRequest {
            conversation_id: None,
            context: Vec::new(),
            text: "Hello".to_string(),
        })
        .await
        .unwrap();

    let forms = recorded_forms(&server).await;
    assert!(!forms[0].contains_key("chat_id"));
    assert_eq!(forms[0]["history"], "[]");
}

#[tokio::test]
async fn test_session_round_trips_chat_id() {
    let server = MockServer::start().await;
    mount_reply(&server, 200, json!({"answer": "Where are you located?", "chat_id": "chat-7"})).await;

    let assistant = Arc::new(HttpAssistant::new(&config_for(server.uri())).unwrap());
    let mut manager = SessionManager::with_timeout(assistant, Duration::from_secs(10));

    manager.open("Need a lawyer").unwrap();
    manager.resolve_next().await.unwrap();
    manager.submit("Phoenix").unwrap();
    manager.resolve_next().await.unwrap();

    let forms = recorded_forms(&server).await;
    assert_eq!(forms.len(), 2);
    assert!(!forms[0].contains_key("chat_id"));
    assert_eq!(forms[1]["chat_id"], "chat-7");
    assert_eq!(forms[1]["query"], "Phoenix");

    let history: Value = serde_json::from_str(&forms[1]["history"]).unwrap();
    assert_eq!(
        history,
        json!([
            {"role": "user", "text": "Need a lawyer"},
            {"role": "assistant", "text": "Where are you located?"}
        ])
    );

    let last = manager.transcript().unwrap().last().unwrap();
    assert_eq!(last.status, TurnStatus::Complete);
}

#[tokio::test]
async fn test_too_many_requests_is_rate_limited() {
    let server = MockServer::start().await;
    mount_reply(&server, 429, json!({"error": "Slow down"})).await;

    let assistant = HttpAssistant::new(&config_for(server.uri())).unwrap();
    let err = assistant
        .reply(AssistantRequest {
            conversation_id: None,
            context: Vec::new(),
            text: "Hello".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::RateLimited);
    assert_eq!(err.message, "Slow down");
}

#[tokio::test]
async fn test_refused_connection_is_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let assistant = HttpAssistant::new(&config_for(format!("http://127.0.0.1:{port}"))).unwrap();
    let err = assistant
        .reply(AssistantRequest {
            conversation_id: None,
            context: Vec::new(),
            text: "Hello".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Network);
}
