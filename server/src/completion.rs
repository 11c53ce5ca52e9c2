use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const HISTORY_WINDOW: usize = 6;
pub const TEMPERATURE: f64 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionMessage {
    pub role: &'static str,
    pub content: String,
}

impl CompletionMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system",
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user",
            content: content.to_string(),
        }
    }

    fn from_turn(turn: &ConversationTurn) -> Self {
        Self {
            role: match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: turn.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<CompletionMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("completion API key is not configured")]
    MissingApiKey,
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion response was malformed: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompletions {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompletions {
    pub fn new(base_url: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.to_string(),
        }
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletions {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(UpstreamError::MissingApiKey);
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&self.request_body(request))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|err| UpstreamError::Malformed(err.to_string()))?;
        reply_text(&payload)
    }
}

fn reply_text(payload: &Value) -> Result<String, UpstreamError> {
    let text = payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| UpstreamError::Malformed("missing choices[0].message.content".into()))?;
    if text.is_empty() {
        return Err(UpstreamError::Malformed("empty content".into()));
    }
    Ok(text.to_string())
}

/// Sends the assembled prompt plus a bounded slice of history upstream.
#[derive(Clone)]
pub struct CompletionGateway {
    service: Arc<dyn CompletionService>,
}

impl CompletionGateway {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    pub async fn complete(
        &self,
        system_prompt: &str,
        history: &[ConversationTurn],
        user_message: &str,
    ) -> Result<String, UpstreamError> {
        let request = CompletionRequest {
            messages: build_messages(system_prompt, history, user_message),
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        };
        self.service.complete(&request).await
    }
}

pub fn build_messages(
    system_prompt: &str,
    history: &[ConversationTurn],
    user_message: &str,
) -> Vec<CompletionMessage> {
    let start_index = history.len().saturating_sub(HISTORY_WINDOW);
    let mut messages = Vec::with_capacity(history.len() - start_index + 2);
    messages.push(CompletionMessage::system(system_prompt));
    messages.extend(history[start_index..].iter().map(CompletionMessage::from_turn));
    messages.push(CompletionMessage::user(user_message));
    messages
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every request and answers with a fixed reply or a failure.
    pub struct ScriptedCompletions {
        reply: Option<String>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedCompletions {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().expect("requests lock").len()
        }

        pub fn last_request(&self) -> Option<CompletionRequest> {
            self.requests.lock().expect("requests lock").last().cloned()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletions {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(request.clone());
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(UpstreamError::Status {
                    status: 429,
                    body: "quota exceeded".to_string(),
                }),
            }
        }
    }
}
