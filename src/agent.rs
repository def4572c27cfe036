//! Tool-calling agent
//!
//! The agent sends the user's request with its tool definitions, runs every
//! function call the model asks for, feeds the results back through
//! `previous_response_id`, and stops at the first reply without calls.

use crate::chat::{AiMessage, ChatModel};
use crate::core::client::ClientError;
use crate::models::responses::{
    FunctionCallItem, FunctionTool, InputItem, ResponsesInput, ResponsesRequest, Role,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Upper bound on request/tool-execution round trips per invocation
pub const MAX_TOOL_ROUNDS: usize = 8;

/// A local function the model may call
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;

    /// Run the tool; failures are reported in the returned text
    fn call(&self, args: &Value) -> String;
}

/// Error types for agent runs
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Agent stopped after {0} tool round(s) without a final answer")]
    TooManyToolRounds(usize),
}

/// One entry of the agent transcript
#[derive(Debug, Clone, PartialEq)]
pub enum AgentMessage {
    Human(String),
    Ai(AiMessage),
    Tool {
        name: String,
        call_id: String,
        content: String,
    },
}

/// Transcript of one agent invocation
#[derive(Debug, Clone, Default)]
pub struct AgentResult {
    pub messages: Vec<AgentMessage>,
}

impl AgentResult {
    /// The final answer, when the transcript ends with one
    pub fn final_message(&self) -> Option<&AiMessage> {
        match self.messages.last() {
            Some(AgentMessage::Ai(message)) => Some(message),
            _ => None,
        }
    }

    /// Tool messages as (name, content) in call order
    pub fn tool_messages(&self) -> Vec<(&str, &str)> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                AgentMessage::Tool { name, content, .. } => Some((name.as_str(), content.as_str())),
                _ => None,
            })
            .collect()
    }
}

pub struct Agent {
    model: ChatModel,
    tools: Vec<Box<dyn Tool>>,
    system_prompt: String,
    max_rounds: usize,
}

impl Agent {
    pub fn new(model: ChatModel, tools: Vec<Box<dyn Tool>>, system_prompt: impl Into<String>) -> Self {
        Self {
            model,
            tools,
            system_prompt: system_prompt.into(),
            max_rounds: MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    fn tool_definitions(&self) -> Vec<FunctionTool> {
        self.tools
            .iter()
            .map(|tool| FunctionTool::new(tool.name(), tool.description(), tool.parameters()))
            .collect()
    }

    fn request(&self, input: Vec<InputItem>) -> ResponsesRequest {
        ResponsesRequest::new(self.model.model(), ResponsesInput::Items(input))
            .with_instructions(self.system_prompt.clone())
            .with_tools(self.tool_definitions())
    }

    fn run_tool(&self, call: &FunctionCallItem) -> String {
        let Some(tool) = self.tools.iter().find(|tool| tool.name() == call.name) else {
            warn!(tool = %call.name, "model requested an unknown tool");
            return format!("Error: unknown tool '{}'", call.name);
        };

        match serde_json::from_str::<Value>(&call.arguments) {
            Ok(args) => tool.call(&args),
            Err(e) => format!("Error: invalid arguments for '{}': {}", call.name, e),
        }
    }

    /// Run the agent on one user request
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Client` when a request fails and
    /// `AgentError::TooManyToolRounds` when the model keeps calling tools
    /// past the round limit.
    pub async fn invoke(&self, user_input: &str) -> Result<AgentResult, AgentError> {
        let mut messages = vec![AgentMessage::Human(user_input.to_string())];
        let mut request = self.request(vec![InputItem::message(Role::User, user_input)]);
        let mut rounds = 0;

        loop {
            let (response, ai_message) = self.model.invoke_request(request).await?;
            let answer_chars = ai_message.text().len();
            messages.push(AgentMessage::Ai(ai_message));

            let calls = response.function_calls();
            if calls.is_empty() {
                debug!(rounds, answer_chars, "agent finished");
                return Ok(AgentResult { messages });
            }
            if rounds == self.max_rounds {
                return Err(AgentError::TooManyToolRounds(rounds));
            }
            rounds += 1;

            let mut outputs = Vec::with_capacity(calls.len());
            for call in calls {
                info!(tool = %call.name, call_id = %call.call_id, arguments = %call.arguments, "running tool");
                let content = self.run_tool(call);
                outputs.push(InputItem::function_output(call.call_id.clone(), content.clone()));
                messages.push(AgentMessage::Tool {
                    name: call.name.clone(),
                    call_id: call.call_id.clone(),
                    content,
                });
            }

            request = self.request(outputs).with_previous_response(response.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::ScriptedApi;
    use crate::models::responses::{Reasoning, ReasoningEffort, ReasoningSummary};
    use crate::tools::{Calculate, CountCharacters};
    use serde_json::json;
    use std::sync::Arc;

    fn function_call_reply(id: &str, name: &str, arguments: &str) -> Value {
        json!({
            "id": id,
            "model": "gpt-5.2-chat",
            "status": "completed",
            "output": [
                {"type": "reasoning", "id": "rs_1", "summary": []},
                {"type": "function_call", "id": "fc_1", "call_id": "call_1", "name": name, "arguments": arguments}
            ],
            "usage": {"input_tokens": 90, "output_tokens": 40, "total_tokens": 130}
        })
    }

    fn answer_reply(text: &str) -> Value {
        json!({
            "id": "resp_final",
            "model": "gpt-5.2-chat",
            "status": "completed",
            "output": [
                {"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": text}]}
            ],
            "usage": {
                "input_tokens": 150,
                "output_tokens": 60,
                "output_tokens_details": {"reasoning_tokens": 20},
                "total_tokens": 210
            }
        })
    }

    fn agent(api: Arc<ScriptedApi>, tools: Vec<Box<dyn Tool>>) -> Agent {
        let model = ChatModel::new(
            api,
            "gpt-5.2-chat",
            Reasoning::new(ReasoningEffort::Medium, ReasoningSummary::Auto),
        );
        Agent::new(model, tools, "You are a helpful math tutor.")
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let api = Arc::new(ScriptedApi::new(vec![
            function_call_reply("resp_a", "calculate", r#"{"expression": "240 / 200"}"#),
            answer_reply("They meet at 11:12 AM, 176 km from Station A."),
        ]));
        let result = agent(api.clone(), vec![Box::new(Calculate)])
            .invoke("When do the trains meet?")
            .await
            .unwrap();

        assert_eq!(result.messages.len(), 4);
        assert_eq!(result.tool_messages(), vec![("calculate", "Result: 1.2")]);
        assert_eq!(
            result.final_message().unwrap().text(),
            "They meet at 11:12 AM, 176 km from Station A."
        );

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);

        let first = serde_json::to_value(&requests[0]).unwrap();
        assert_eq!(first["instructions"], "You are a helpful math tutor.");
        assert_eq!(first["tools"][0]["name"], "calculate");
        assert_eq!(first["tools"][0]["type"], "function");
        assert_eq!(first["reasoning"]["effort"], "medium");

        let second = serde_json::to_value(&requests[1]).unwrap();
        assert_eq!(second["previous_response_id"], "resp_a");
        assert_eq!(
            second["input"][0],
            json!({"type": "function_call_output", "call_id": "call_1", "output": "Result: 1.2"})
        );
        assert_eq!(second["instructions"], "You are a helpful math tutor.");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let api = Arc::new(ScriptedApi::new(vec![
            function_call_reply("resp_a", "search", "{}"),
            answer_reply("I could not search."),
        ]));
        let result = agent(api, vec![Box::new(CountCharacters)])
            .invoke("Look it up")
            .await
            .unwrap();
        assert_eq!(result.tool_messages(), vec![("search", "Error: unknown tool 'search'")]);
    }

    #[tokio::test]
    async fn test_malformed_arguments() {
        let api = Arc::new(ScriptedApi::new(vec![
            function_call_reply("resp_a", "calculate", "{expression"),
            answer_reply("Done."),
        ]));
        let result = agent(api, vec![Box::new(Calculate)]).invoke("2+2").await.unwrap();
        let (_, content) = result.tool_messages()[0];
        assert!(content.starts_with("Error: invalid arguments for 'calculate'"));
    }

    #[tokio::test]
    async fn test_round_limit() {
        let api = Arc::new(ScriptedApi::new(vec![
            function_call_reply("resp_a", "calculate", r#"{"expression": "1 + 1"}"#),
            function_call_reply("resp_b", "calculate", r#"{"expression": "2 + 2"}"#),
        ]));
        let err = agent(api, vec![Box::new(Calculate)])
            .with_max_rounds(1)
            .invoke("Keep going")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::TooManyToolRounds(1)));
    }

    #[tokio::test]
    async fn test_no_tools_sends_no_tool_field() {
        let api = Arc::new(ScriptedApi::new(vec![answer_reply("Knights and knaves.")]));
        let result = agent(api.clone(), Vec::new()).invoke("Puzzle").await.unwrap();
        assert!(result.tool_messages().is_empty());

        let requests = api.requests.lock().unwrap();
        let sent = serde_json::to_value(&requests[0]).unwrap();
        assert!(sent.get("tools").is_none());
    }
}
