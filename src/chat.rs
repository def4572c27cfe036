//! Chat-model layer over the Responses API
//!
//! `ChatModel` takes system/human messages, applies a fixed reasoning
//! configuration and turns each response into an `AiMessage`: a list of
//! content blocks plus usage and response metadata.

use crate::core::client::{ClientError, ResponsesApi};
use crate::models::responses::{
    ContentPart, InputItem, OutputItem, Reasoning, ResponsesInput, ResponsesRequest,
    ResponsesResponse, Role, Usage,
};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::warn;

/// Input message for the chat layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    System(String),
    Human(String),
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::Human(content.into())
    }

    fn to_input_item(&self) -> InputItem {
        match self {
            ChatMessage::System(content) => InputItem::message(Role::System, content.clone()),
            ChatMessage::Human(content) => InputItem::message(Role::User, content.clone()),
        }
    }
}

/// Content block of an AI message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Reasoning { summary: Vec<String> },
    Text { text: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTokenDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTokenDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<u64>,
}

/// Token usage in the chat layer's naming
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub input_token_details: InputTokenDetails,
    pub output_token_details: OutputTokenDetails,
}

impl From<&Usage> for UsageMetadata {
    fn from(usage: &Usage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.total_tokens,
            input_token_details: InputTokenDetails {
                cache_read: usage.cached_tokens(),
            },
            output_token_details: OutputTokenDetails {
                reasoning: usage
                    .output_tokens_details
                    .as_ref()
                    .map(|d| d.reasoning_tokens),
            },
        }
    }
}

/// Model reply as seen by chat callers
#[derive(Debug, Clone, PartialEq)]
pub struct AiMessage {
    pub content: Vec<ContentBlock>,
    pub usage_metadata: Option<UsageMetadata>,
    pub response_metadata: Value,
}

impl AiMessage {
    /// Visible answer text, blocks joined in order
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Reasoning { .. } => None,
            })
            .collect()
    }
}

/// Convert a Responses API result into an `AiMessage`
pub fn to_ai_message(response: &ResponsesResponse) -> AiMessage {
    let mut content = Vec::new();

    for item in &response.output {
        match item {
            OutputItem::Reasoning(reasoning) => {
                content.push(ContentBlock::Reasoning {
                    summary: reasoning
                        .summary_texts()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                });
            }
            OutputItem::Message(message) => {
                for part in &message.content {
                    match part {
                        ContentPart::OutputText { text } => content.push(ContentBlock::Text {
                            text: text.clone(),
                        }),
                        ContentPart::Refusal { refusal } => content.push(ContentBlock::Text {
                            text: refusal.clone(),
                        }),
                        ContentPart::Unknown => {}
                    }
                }
            }
            OutputItem::FunctionCall(_) | OutputItem::Unknown => {}
        }
    }

    let created_at = response
        .created_at
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339());

    AiMessage {
        content,
        usage_metadata: response.usage.as_ref().map(UsageMetadata::from),
        response_metadata: json!({
            "id": response.id,
            "model_name": response.model,
            "status": response.status,
            "created_at": created_at,
        }),
    }
}

/// Chat model bound to one deployment and reasoning configuration
#[derive(Clone)]
pub struct ChatModel {
    api: Arc<dyn ResponsesApi>,
    model: String,
    reasoning: Reasoning,
}

impl ChatModel {
    pub fn new(api: Arc<dyn ResponsesApi>, model: impl Into<String>, reasoning: Reasoning) -> Self {
        Self {
            api,
            model: model.into(),
            reasoning,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request for a list of messages
    pub fn request_for(&self, messages: &[ChatMessage]) -> ResponsesRequest {
        let items = messages.iter().map(ChatMessage::to_input_item).collect();
        ResponsesRequest::new(self.model.clone(), ResponsesInput::Items(items))
            .with_reasoning(self.reasoning.clone())
    }

    /// Send messages and return the reply
    pub async fn invoke(&self, messages: &[ChatMessage]) -> Result<AiMessage, ClientError> {
        let (_, message) = self.invoke_request(self.request_for(messages)).await?;
        Ok(message)
    }

    /// Send a prepared request with this model's reasoning applied
    ///
    /// Returns the raw response as well, for callers that need output items
    /// the chat view drops (function calls).
    pub async fn invoke_request(
        &self,
        mut request: ResponsesRequest,
    ) -> Result<(ResponsesResponse, AiMessage), ClientError> {
        request.model = self.model.clone();
        request.reasoning = Some(self.reasoning.clone());
        let response = self.api.create_response(&request).await?;
        if !response.is_completed() {
            warn!(id = %response.id, status = ?response.status, "response did not complete");
        }
        let message = to_ai_message(&response);
        Ok((response, message))
    }
}
