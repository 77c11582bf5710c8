//! Chat-completions wire types and the HTTP backend client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt::Debug, time::Duration};

use crate::{config::BackendConfig, error::BackendError, tools::ToolSchema};

/// Fixed per-request timeout for the backend.
pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// A conversation entry, tagged by role on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: Option<String>,
        #[serde(
            default,
            deserialize_with = "null_as_empty",
            skip_serializing_if = "Vec::is_empty"
        )]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        content: String,
        tool_call_id: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System { content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User { content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Tool {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            ChatMessage::System { .. } => "system",
            ChatMessage::User { .. } => "user",
            ChatMessage::Assistant { .. } => "assistant",
            ChatMessage::Tool { .. } => "tool",
        }
    }

    /// Text content; empty for an assistant message that only carries tool calls.
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System { content }
            | ChatMessage::User { content }
            | ChatMessage::Tool { content, .. } => content,
            ChatMessage::Assistant { content, .. } => content.as_deref().unwrap_or_default(),
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            ChatMessage::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

// Some local backends send `"tool_calls": null` on plain replies.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, as produced by the model.
    pub arguments: String,
}

impl ToolCall {
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// `choices[0].message`; only `content` and `tool_calls` are read, `role` is not required.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    tool_calls: Vec<ToolCall>,
}

impl From<ResponseMessage> for ChatMessage {
    fn from(msg: ResponseMessage) -> Self {
        ChatMessage::Assistant {
            content: msg.content,
            tool_calls: msg.tool_calls,
        }
    }
}

/// Something that answers chat-completions requests.
#[async_trait]
pub trait ChatBackend: Send + Sync + Debug {
    /// Send one request and return `choices[0].message`.
    async fn send(&self, request: &ChatRequest) -> Result<ChatMessage, BackendError>;
}

/// OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    url: String,
    http: Client,
}

impl HttpChatBackend {
    pub fn new(url: impl Into<String>) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(BACKEND_TIMEOUT).build()?;
        Ok(Self { url: url.into(), http })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(config.url.clone())
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatMessage, BackendError> {
        tracing::debug!(
            url = %self.url,
            messages = request.messages.len(),
            with_tools = request.tools.is_some(),
            "sending chat request"
        );

        let res = self.http.post(&self.url).json(request).send().await?;

        let status = res.status();
        let body = res.text().await?;

        let result = interpret_response(status, &body);
        if let Err(err) = &result {
            tracing::warn!(%status, "chat backend request failed: {err}");
        }
        result
    }
}

fn interpret_response(status: StatusCode, body: &str) -> Result<ChatMessage, BackendError> {
    if status != StatusCode::OK {
        return Err(BackendError::Status {
            status_code: status.as_u16(),
            body: body.to_string(),
        });
    }

    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedResponse(format!("invalid JSON: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| ChatMessage::from(c.message))
        .ok_or_else(|| BackendError::MalformedResponse("response contained no choices".into()))
}
