//! Responses API client
//!
//! This module provides an async HTTP client for the Azure AI Foundry v1
//! Responses endpoint, plus the `ResponsesApi` trait the chat and agent
//! layers are written against.

use crate::core::constants::{header, path, sse};
use crate::models::responses::{ResponsesRequest, ResponsesResponse, StreamEvent};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use futures::TryStreamExt;
use futures::stream::Stream;
use reqwest::Client;
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, error};
use uuid::Uuid;

/// Error types that can occur during Responses API interactions
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

/// Stream of decoded server-sent events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ClientError>> + Send>>;

/// Anything that can answer Responses API requests
#[async_trait]
pub trait ResponsesApi: Send + Sync {
    /// Create a response and decode it into typed output items
    async fn create_response(
        &self,
        request: &ResponsesRequest,
    ) -> Result<ResponsesResponse, ClientError>;

    /// Create a response and keep the JSON exactly as returned
    async fn create_response_raw(&self, request: &ResponsesRequest) -> Result<Value, ClientError> {
        let response = self.create_response(request).await?;
        serde_json::to_value(response).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Create a streamed response
    async fn create_response_stream(
        &self,
        _request: ResponsesRequest,
    ) -> Result<EventStream, ClientError> {
        Err(ClientError::Stream("streaming is not supported".to_string()))
    }
}

/// One decoded line of an SSE body
#[derive(Debug)]
pub enum SseLine {
    Event(Box<StreamEvent>),
    Done,
    Skip,
}

/// Decode a single line of a `text/event-stream` body
///
/// Only `data:` lines carry payloads; `event:` lines and blank separators
/// are skipped since every payload repeats its type.
pub fn decode_sse_line(line: &str) -> Result<SseLine, ClientError> {
    let Some(payload) = line.trim().strip_prefix(sse::DATA_PREFIX) else {
        return Ok(SseLine::Skip);
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(SseLine::Skip);
    }
    if payload == sse::DONE {
        return Ok(SseLine::Done);
    }
    serde_json::from_str(payload)
        .map(|event| SseLine::Event(Box::new(event)))
        .map_err(|e| ClientError::Stream(format!("invalid event payload: {}", e)))
}

/// Pull the human-readable message out of an error body
///
/// Azure wraps failures as `{"error": {"message": ...}}`; anything else is
/// returned unchanged.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Responses API client for an Azure AI Foundry resource
pub struct ResponsesClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ResponsesClient {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Azure OpenAI API key
    /// * `base_url` - Resource-level v1 base URL ending in `/`
    /// * `timeout` - Request timeout in seconds
    pub fn new(api_key: String, base_url: String, timeout: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    /// Classify service errors and provide helpful messages
    fn classify_error(error_detail: &str) -> String {
        let error_lower = error_detail.to_lowercase();

        if error_lower.contains("invalid_api_key")
            || error_lower.contains("access denied")
            || error_lower.contains("unauthorized")
        {
            return "Invalid API key. Please check your AZURE_OPENAI_API_KEY configuration."
                .to_string();
        }

        if error_lower.contains("rate_limit")
            || error_lower.contains("rate limit")
            || error_lower.contains("quota")
        {
            return "Rate limit exceeded. Please wait and try again, or raise the deployment quota."
                .to_string();
        }

        if error_lower.contains("deploymentnotfound")
            || (error_lower.contains("deployment") && error_lower.contains("does not exist"))
        {
            return "Deployment not found. Please check your AZURE_OPENAI_DEPLOYMENT configuration."
                .to_string();
        }

        if error_lower.contains("reasoning.effort") {
            return format!(
                "The deployment does not support the requested reasoning effort: {}",
                error_detail
            );
        }

        error_detail.to_string()
    }

    fn status_error(status: u16, body: &str) -> ClientError {
        let message = Self::classify_error(&extract_error_message(body));
        match status {
            401 | 403 => ClientError::Authentication(message),
            429 => ClientError::RateLimit(message),
            400 => ClientError::BadRequest(message),
            404 => ClientError::NotFound(message),
            _ => ClientError::ApiError { status, message },
        }
    }

    /// Post a request and check the status
    async fn send(&self, request: &ResponsesRequest) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.base_url, path::RESPONSES);
        let request_id = Uuid::new_v4().to_string();
        debug!(%url, model = %request.model, %request_id, "sending responses request");

        let response = self
            .client
            .post(&url)
            .header(header::API_KEY, &self.api_key)
            .header(header::CLIENT_REQUEST_ID, &request_id)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = status.as_u16(), %request_id, "responses request failed");
            return Err(Self::status_error(status.as_u16(), &error_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl ResponsesApi for ResponsesClient {
    async fn create_response(
        &self,
        request: &ResponsesRequest,
    ) -> Result<ResponsesResponse, ClientError> {
        let response = self.send(request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let decoded: ResponsesResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        debug!(
            id = %decoded.id,
            reasoning_items = decoded.reasoning_items().len(),
            answer_chars = decoded.output_text().len(),
            "response received"
        );
        Ok(decoded)
    }

    async fn create_response_raw(&self, request: &ResponsesRequest) -> Result<Value, ClientError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn create_response_stream(
        &self,
        mut request: ResponsesRequest,
    ) -> Result<EventStream, ClientError> {
        request.stream = Some(true);
        let response = self.send(&request).await?;

        let byte_stream = response.bytes_stream().map_err(std::io::Error::other);
        let reader = tokio_util::io::StreamReader::new(byte_stream);
        let mut lines = Box::pin(LinesStream::new(BufReader::new(reader).lines()));

        let stream = try_stream! {
            while let Some(line) = lines.next().await {
                let line = line.map_err(|e| ClientError::Stream(e.to_string()))?;
                match decode_sse_line(&line)? {
                    SseLine::Event(event) => yield *event,
                    SseLine::Done => break,
                    SseLine::Skip => {}
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::responses::{
        Reasoning, ReasoningEffort, ReasoningSummary, ResponsesInput,
    };
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header as header_matcher, method, path as path_matcher};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ResponsesRequest {
        ResponsesRequest::new(
            "gpt-5.2-chat",
            ResponsesInput::Text("How many r's are in the word 'strawberry'?".to_string()),
        )
        .with_reasoning(Reasoning::new(ReasoningEffort::Medium, ReasoningSummary::Auto))
    }

    fn client_for(server: &MockServer) -> ResponsesClient {
        ResponsesClient::new(
            "test-key".to_string(),
            format!("{}/openai/v1/", server.uri()),
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_classify_auth_error() {
        let result = ResponsesClient::classify_error("Access denied due to invalid subscription key");
        assert!(result.contains("AZURE_OPENAI_API_KEY"));
    }

    #[test]
    fn test_classify_deployment_error() {
        let result = ResponsesClient::classify_error(
            "The API deployment for this resource does not exist.",
        );
        assert!(result.contains("AZURE_OPENAI_DEPLOYMENT"));
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error":{"message":"boom","type":"server_error"}}"#;
        assert_eq!(extract_error_message(body), "boom");
        assert_eq!(extract_error_message("plain text"), "plain text");
    }

    #[test]
    fn test_decode_sse_lines() {
        assert!(matches!(decode_sse_line("event: response.created").unwrap(), SseLine::Skip));
        assert!(matches!(decode_sse_line("").unwrap(), SseLine::Skip));
        assert!(matches!(decode_sse_line("data: [DONE]").unwrap(), SseLine::Done));
        let line = r#"data: {"type":"response.reasoning_summary_text.delta","delta":"Think"}"#;
        match decode_sse_line(line).unwrap() {
            SseLine::Event(event) => assert!(matches!(
                *event,
                StreamEvent::ReasoningSummaryDelta { ref delta } if delta == "Think"
            )),
            other => panic!("unexpected line: {:?}", other),
        }
        assert!(decode_sse_line("data: {not json").is_err());
    }

    #[tokio::test]
    async fn test_create_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_matcher("/openai/v1/responses"))
            .and(header_matcher("api-key", "test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-5.2-chat",
                "reasoning": {"effort": "medium", "summary": "auto"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_1",
                "model": "gpt-5.2-chat",
                "status": "completed",
                "output": [{
                    "type": "message",
                    "role": "assistant",
                    "content": [{"type": "output_text", "text": "There are 3 r's."}]
                }],
                "usage": {
                    "input_tokens": 15,
                    "output_tokens": 80,
                    "output_tokens_details": {"reasoning_tokens": 64},
                    "total_tokens": 95
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).create_response(&request()).await.unwrap();
        assert_eq!(response.output_text(), "There are 3 r's.");
        assert_eq!(response.usage.unwrap().reasoning_tokens(), 64);
    }

    #[tokio::test]
    async fn test_raw_response_keeps_unknown_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_matcher("/openai/v1/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_2",
                "model": "gpt-5.2-chat",
                "output": [],
                "service_tier": "default"
            })))
            .mount(&server)
            .await;

        let raw = client_for(&server).create_response_raw(&request()).await.unwrap();
        assert_eq!(raw["service_tier"], "default");
    }

    #[tokio::test]
    async fn test_unsupported_effort_is_bad_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_matcher("/openai/v1/responses"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "message": "Unsupported value: 'reasoning.effort' does not support 'high' with this model.",
                    "type": "invalid_request_error",
                    "param": "reasoning.effort",
                    "code": "unsupported_value"
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).create_response(&request()).await.unwrap_err();
        match err {
            ClientError::BadRequest(message) => assert!(message.contains("reasoning effort")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = client_for(&server).create_response(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_stream_events() {
        let server = MockServer::start().await;
        let body = concat!(
            "event: response.created\n",
            "data: {\"type\":\"response.created\",\"sequence_number\":0}\n\n",
            "event: response.reasoning_summary_text.delta\n",
            "data: {\"type\":\"response.reasoning_summary_text.delta\",\"delta\":\"Count letters.\"}\n\n",
            "event: response.output_text.delta\n",
            "data: {\"type\":\"response.output_text.delta\",\"delta\":\"3\"}\n\n",
            "event: response.completed\n",
            "data: {\"type\":\"response.completed\",\"response\":{\"id\":\"resp_3\",\"model\":\"gpt-5.2-chat\",\"status\":\"completed\",\"output\":[]}}\n\n",
        );
        Mock::given(method("POST"))
            .and(path_matcher("/openai/v1/responses"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let stream = client_for(&server)
            .create_response_stream(request())
            .await
            .unwrap();
        let events: Vec<StreamEvent> = stream.try_collect().await.unwrap();

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], StreamEvent::Other));
        assert!(matches!(events[1], StreamEvent::ReasoningSummaryDelta { .. }));
        assert!(matches!(events[2], StreamEvent::OutputTextDelta { ref delta } if delta == "3"));
        assert!(matches!(events[3], StreamEvent::Completed { ref response } if response.id == "resp_3"));
    }
}
