//! Minimal Anthropic Messages API client: one request, one response, tools.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::ScoringError;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ── Wire types ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            messages: Vec::new(),
            system: None,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Offer `tool` and require the model to call it.
    pub fn forced_tool(mut self, tool: ToolDefinition) -> Self {
        self.tool_choice = Some(serde_json::json!({"type": "tool", "name": tool.name.as_str()}));
        self.tools.push(tool);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    /// Input of the first `tool_use` block calling `name`.
    pub fn tool_input(&self, name: &str) -> Option<&Value> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse {
                name: called,
                input,
                ..
            } if called == name => Some(input),
            _ => None,
        })
    }
}

// ── Client ──

#[derive(Debug, Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, ScoringError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            base_url: ANTHROPIC_API_URL.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, ScoringError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Single POST to `/messages`. Non-2xx responses become
    /// [`ScoringError::Api`] carrying the status and body.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ScoringError> {
        let url = format!("{}/messages", self.base_url);
        let resp = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ScoringError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatResponse = serde_json::from_str(&body)?;
        debug!(
            model = %request.model,
            stop_reason = response.stop_reason.as_deref().unwrap_or(""),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Claude response"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool() -> ToolDefinition {
        ToolDefinition {
            name: "score_bill".into(),
            description: "Record scores".into(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn forced_tool_serializes_choice() {
        let req = ChatRequest::new("m", 512)
            .system("sys")
            .message(Message::user("hi"))
            .forced_tool(tool());
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["tool_choice"], json!({"type": "tool", "name": "score_bill"}));
        assert_eq!(value["tools"][0]["name"], "score_bill");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["system"], "sys");
    }

    #[test]
    fn bare_request_omits_optional_fields() {
        let value = serde_json::to_value(ChatRequest::new("m", 10)).unwrap();
        assert!(value.get("system").is_none());
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }

    #[test]
    fn finds_named_tool_input() {
        let response: ChatResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "thinking"},
                {"type": "tool_use", "id": "t1", "name": "other", "input": {"x": 1}},
                {"type": "tool_use", "id": "t2", "name": "score_bill", "input": {"notes": "ok"}}
            ],
            "stop_reason": "tool_use"
        }))
        .unwrap();
        assert_eq!(response.tool_input("score_bill").unwrap()["notes"], "ok");
        assert!(response.tool_input("missing").is_none());
    }

    #[tokio::test]
    async fn sends_auth_headers_and_returns_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({"model": "m"})))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClaudeClient::new("sk-test", Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.uri());
        let err = client
            .chat(&ChatRequest::new("m", 16).message(Message::user("hi")))
            .await
            .unwrap_err();
        match err {
            ScoringError::Api { status, body } => {
                assert_eq!(status, 529);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
