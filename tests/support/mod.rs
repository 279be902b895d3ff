#![allow(dead_code)]

use async_trait::async_trait;
use openlaw_intake::RemoteError;
use openlaw_intake::llm::{Assistant, AssistantReply, AssistantRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub const TIMEOUT: Duration = Duration::from_secs(30);

/// A request the test answers by hand
pub struct PendingCall {
    pub request: AssistantRequest,
    responder: oneshot::Sender<Result<AssistantReply, RemoteError>>,
}

impl PendingCall {
    /// Returns false when the request was already abandoned
    pub fn succeed(self, text: &str) -> bool {
        self.responder.send(Ok(AssistantReply::new(text))).is_ok()
    }

    pub fn succeed_with_id(self, text: &str, conversation_id: &str) -> bool {
        self.responder
            .send(Ok(AssistantReply {
                text: text.to_string(),
                conversation_id: Some(conversation_id.to_string()),
            }))
            .is_ok()
    }

    pub fn fail(self, err: RemoteError) -> bool {
        self.responder.send(Err(err)).is_ok()
    }

    /// Resolves once the controller has dropped the request
    pub async fn abandoned(&mut self) {
        self.responder.closed().await;
    }
}

/// Assistant whose every reply is released by the test
pub struct ScriptedAssistant {
    calls: mpsc::UnboundedSender<PendingCall>,
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn reply(&self, request: AssistantRequest) -> Result<AssistantReply, RemoteError> {
        let (responder, answer) = oneshot::channel();
        let _ = self.calls.send(PendingCall { request, responder });
        match answer.await {
            Ok(result) => result,
            Err(_) => std::future::pending().await,
        }
    }
}

pub fn scripted() -> (Arc<ScriptedAssistant>, mpsc::UnboundedReceiver<PendingCall>) {
    let (calls, rx) = mpsc::unbounded_channel();
    (Arc::new(ScriptedAssistant { calls }), rx)
}

/// Wait for the next request to reach the assistant
pub async fn next_call(calls: &mut mpsc::UnboundedReceiver<PendingCall>) -> PendingCall {
    calls.recv().await.expect("assistant dropped")
}
