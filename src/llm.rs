use crate::config::Config;
use crate::error::RemoteError;
use crate::events::TurnRole;
use crate::prompts;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Message in conversation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: TurnRole,
    pub text: String,
}

/// Request to send to the remote assistant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantRequest {
    /// Server-issued conversation id, once the first reply has supplied one
    pub conversation_id: Option<String>,
    /// Prior turns, oldest first
    pub context: Vec<ContextMessage>,
    /// The new user text
    pub text: String,
}

/// Reply from the remote assistant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub text: String,
    pub conversation_id: Option<String>,
}

impl AssistantReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            conversation_id: None,
        }
    }
}

/// "Send conversation, get reply-or-error" capability
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn reply(&self, request: AssistantRequest) -> Result<AssistantReply, RemoteError>;
}

/// Client for the OpenLaw `/search` endpoint
#[derive(Clone)]
pub struct HttpAssistant {
    client: reqwest::Client,
    search_url: String,
}

impl HttpAssistant {
    /// The controller owns the overall deadline, so the client only bounds connecting.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            search_url: config.search_url(),
        })
    }
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn reply(&self, request: AssistantRequest) -> Result<AssistantReply, RemoteError> {
        let history =
            serde_json::to_string(&request.context).unwrap_or_else(|_| "[]".to_string());

        let mut form = vec![("query", request.text), ("history", history)];
        if let Some(chat_id) = request.conversation_id {
            form.push(("chat_id", chat_id));
        }

        let response = self
            .client
            .post(&self.search_url)
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        parse_search_response(status, &body)
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::timeout(err.to_string())
    } else if err.is_decode() || err.is_body() {
        RemoteError::invalid_response(err.to_string())
    } else {
        RemoteError::network(err.to_string())
    }
}

/// Body of a `/search` reply. Which fields are set depends on the detected intent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    answer: Option<String>,
    message: Option<String>,
    disclaimer: Option<String>,
    encourage_upload: Option<String>,
    completion_message: Option<String>,
    matches: Option<Vec<AttorneyMatch>>,
    download_filename: Option<String>,
    show_form: Option<bool>,
    intent: Option<String>,
    chat_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AttorneyMatch {
    name: Option<String>,
    firm: Option<String>,
    #[serde(deserialize_with = "lenient_rating")]
    rating: Option<Rating>,
    explanation: Option<String>,
}

/// The back end stores ratings as free-form values
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum Rating {
    Number(f64),
    Text(String),
}

impl Rating {
    fn display(&self) -> Option<String> {
        match self {
            Rating::Number(value) => Some(format!("{value:.1}")),
            Rating::Text(text) => match text.trim().parse::<f64>() {
                Ok(value) => Some(format!("{value:.1}")),
                Err(_) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
            },
        }
    }
}

/// A rating of any other shape is dropped rather than failing the reply
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<Rating>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: Option<String>,
}

/// Map an HTTP status and body to a reply or a remote error
pub fn parse_search_response(status: u16, body: &str) -> Result<AssistantReply, RemoteError> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(if status == 429 {
            RemoteError::rate_limited(detail)
        } else {
            RemoteError::server_error(detail)
        });
    }

    let parsed: SearchResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::invalid_response(format!("Malformed reply: {e}")))?;

    if let Some(error) = parsed.error {
        return Err(RemoteError::server_error(error));
    }

    let text = render_reply(&parsed)?;
    Ok(AssistantReply {
        text,
        conversation_id: parsed.chat_id.filter(|id| !id.is_empty()),
    })
}

fn render_reply(parsed: &SearchResponse) -> Result<String, RemoteError> {
    let mut sections: Vec<String> = [
        &parsed.answer,
        &parsed.message,
        &parsed.disclaimer,
        &parsed.encourage_upload,
        &parsed.completion_message,
    ]
    .into_iter()
    .flatten()
    .map(|s| s.trim())
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect();

    if let Some(matches) = &parsed.matches {
        sections.push(render_matches(matches));
    }

    if let Some(filename) = &parsed.download_filename {
        sections.push(format!("Your document is ready to download as {filename}."));
    }

    if parsed.show_form == Some(true) {
        sections.push(prompts::CONTACT_FORM_HINT.to_string());
    }

    if sections.is_empty() && parsed.intent.as_deref() == Some("near_me") {
        sections.push(prompts::NEAR_ME_PROMPT.to_string());
    }

    if sections.is_empty() {
        return Err(RemoteError::invalid_response(
            "Reply contained nothing to show",
        ));
    }

    Ok(sections.join("\n\n"))
}

fn render_matches(matches: &[AttorneyMatch]) -> String {
    if matches.is_empty() {
        return "I couldn't find attorneys matching that yet. Could you tell me more about your case or where you're located?".to_string();
    }

    let mut out = String::from("Here are attorneys who match your request:");
    for (i, attorney) in matches.iter().enumerate() {
        let name = attorney.name.as_deref().unwrap_or("Unnamed attorney");
        let _ = write!(out, "\n{}. {}", i + 1, name);
        if let Some(firm) = attorney.firm.as_deref().filter(|f| !f.is_empty()) {
            let _ = write!(out, " ({firm})");
        }
        if let Some(rating) = attorney.rating.as_ref().and_then(Rating::display) {
            let _ = write!(out, " rated {rating}");
        }
        if let Some(explanation) = attorney.explanation.as_deref() {
            let _ = write!(out, ": {}", explanation.trim());
        }
    }
    out
}
