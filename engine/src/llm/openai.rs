use super::{
    FinalAnswer, GenerateOptions, LLMError, LLMProvider, LLMResponse, Message, MessageRole,
    ToolCall,
};
use crate::config::LlmConfig;
use crate::secrets::SecretString;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::debug;

/// Client for OpenAI-compatible chat-completions endpoints
pub struct OpenAIProvider {
    base_url: String,
    model: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: &LlmConfig, api_key: SecretString) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn render_message(msg: &Message) -> Value {
        match msg.role {
            MessageRole::Tool => json!({
                "role": "tool",
                "tool_call_id": msg.tool_call_id,
                "content": msg.content,
            }),
            MessageRole::Assistant if !msg.tool_calls.is_empty() => {
                let calls: Vec<Value> = msg
                    .tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": { "name": call.name, "arguments": call.arguments },
                        })
                    })
                    .collect();
                json!({ "role": "assistant", "content": Value::Null, "tool_calls": calls })
            }
            _ if !msg.attachments.is_empty() => {
                let mut parts = vec![json!({ "type": "text", "text": msg.content })];
                for attachment in &msg.attachments {
                    let mime = attachment.mime_type.as_deref().unwrap_or("image/png");
                    let url = format!("data:{};base64,{}", mime, BASE64.encode(&attachment.payload));
                    parts.push(json!({ "type": "image_url", "image_url": { "url": url } }));
                }
                json!({ "role": msg.role.to_string(), "content": parts })
            }
            _ => json!({ "role": msg.role.to_string(), "content": msg.content }),
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> super::Result<LLMResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let api_messages: Vec<Value> = messages.iter().map(Self::render_message).collect();

        let mut payload = json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": options.temperature,
        });

        if !options.tools.is_empty() {
            let tools: Vec<Value> = options
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            payload["tools"] = Value::Array(tools);
        }

        debug!(
            "POST {} ({} messages, {} tools)",
            url,
            messages.len(),
            options.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key.unsecure()))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                _ => LLMError::InvalidRequest(format!("HTTP {}: {}", status, text)),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let message = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| LLMError::ParseError("No message in response".to_string()))?;

        if let Some(call) = message
            .get("tool_calls")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
        {
            let id = call.get("id").and_then(|v| v.as_str()).unwrap_or_default();
            let function = call
                .get("function")
                .ok_or_else(|| LLMError::ParseError("Tool call without function".to_string()))?;
            let name = function
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| LLMError::ParseError("Tool call without name".to_string()))?;
            let arguments = function
                .get("arguments")
                .and_then(|v| v.as_str())
                .unwrap_or("{}");
            return Ok(LLMResponse::ToolCall(ToolCall::new(id, name, arguments)));
        }

        match message.get("content").and_then(|c| c.as_str()) {
            Some(content) => {
                if let Some(tool_call) = super::parse_tool_calls(content) {
                    return Ok(LLMResponse::ToolCall(tool_call));
                }
                Ok(LLMResponse::FinalAnswer(FinalAnswer::new(content)))
            }
            None => Err(LLMError::ParseError("Empty content".to_string())),
        }
    }
}
