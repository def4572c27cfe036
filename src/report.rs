//! Text rendering of responses, chat replies and agent transcripts
//!
//! Every renderer returns a `String`; printing is left to the caller.

use crate::agent::AgentResult;
use crate::chat::{AiMessage, ContentBlock, UsageMetadata};
use crate::models::responses::{ContentPart, OutputItem, ResponsesResponse, Usage};

/// Width of the `=` rule around section labels
pub const RULE_WIDTH: usize = 60;

/// Tool output is cut to this many characters in transcripts
pub const TOOL_PREVIEW_CHARS: usize = 120;

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Section banner: rule, indented label, rule
pub fn banner(label: &str) -> String {
    format!("\n{}\n  {}\n{}", rule(), label, rule())
}

/// Token usage section for a raw Responses API usage object
pub fn usage_section(usage: Option<&Usage>) -> Vec<String> {
    let mut lines = vec!["\n--- Token Usage ---".to_string()];
    match usage {
        Some(usage) => {
            lines.push(format!("  Input tokens:     {}", usage.input_tokens));
            lines.push(format!("  Output tokens:    {}", usage.output_tokens));
            if usage.output_tokens_details.is_some() {
                lines.push(format!("  Reasoning tokens: {}", usage.reasoning_tokens()));
                lines.push(format!("  Answer tokens:    {}", usage.visible_output_tokens()));
            }
            lines.push(format!("  Total tokens:     {}", usage.total_tokens));
        }
        None => lines.push("  N/A".to_string()),
    }
    lines
}

/// Render a Responses API result: reasoning summaries, answer, usage
pub fn render_response(label: &str, response: &ResponsesResponse) -> String {
    let mut lines = vec![banner(label)];

    for item in &response.output {
        match item {
            OutputItem::Reasoning(reasoning) => {
                let texts = reasoning.summary_texts();
                if texts.is_empty() {
                    lines.push("\n--- Reasoning (no summary returned) ---".to_string());
                } else {
                    lines.push("\n--- Reasoning Summary ---".to_string());
                    lines.extend(texts.into_iter().map(str::to_string));
                }
            }
            OutputItem::Message(message) => {
                for part in &message.content {
                    match part {
                        ContentPart::OutputText { text } => {
                            lines.push(format!("\n--- Answer ---\n{}", text))
                        }
                        ContentPart::Refusal { refusal } => {
                            lines.push(format!("\n--- Refusal ---\n{}", refusal))
                        }
                        ContentPart::Unknown => {}
                    }
                }
            }
            OutputItem::FunctionCall(_) | OutputItem::Unknown => {}
        }
    }

    lines.extend(usage_section(response.usage.as_ref()));
    lines.push(String::new());
    lines.join("\n")
}

fn content_lines(message: &AiMessage) -> Vec<String> {
    let mut lines = Vec::new();
    for block in &message.content {
        match block {
            ContentBlock::Reasoning { summary } => {
                for text in summary.iter().filter(|t| !t.is_empty()) {
                    lines.push(format!("\n--- Reasoning Summary ---\n{}", text));
                }
            }
            ContentBlock::Text { text } => lines.push(format!("\n--- Answer ---\n{}", text)),
        }
    }
    lines
}

fn usage_metadata_lines(heading: &str, usage: &UsageMetadata) -> Vec<String> {
    let mut lines = vec![format!("\n--- {} ---", heading)];
    lines.push(format!("  Input tokens:     {}", usage.input_tokens));
    lines.push(format!("  Output tokens:    {}", usage.output_tokens));
    if let Some(reasoning) = usage.output_token_details.reasoning {
        lines.push(format!("  Reasoning tokens: {}", reasoning));
    }
    lines.push(format!("  Total tokens:     {}", usage.total_tokens));
    lines
}

/// Render a chat reply
pub fn render_ai_message(label: &str, message: &AiMessage) -> String {
    let mut lines = vec![banner(label)];
    lines.extend(content_lines(message));
    if let Some(usage) = &message.usage_metadata {
        lines.extend(usage_metadata_lines("Token Usage", usage));
    }
    lines.push(String::new());
    lines.join("\n")
}

fn preview(content: &str) -> String {
    content.chars().take(TOOL_PREVIEW_CHARS).collect()
}

/// Render an agent transcript: final answer, its usage, tools used
pub fn render_agent_result(label: &str, result: &AgentResult) -> String {
    let mut lines = vec![banner(label)];

    if result.messages.is_empty() {
        lines.push("  (no messages returned)".to_string());
        return lines.join("\n");
    }

    if let Some(message) = result.final_message() {
        lines.extend(content_lines(message));
        if let Some(usage) = &message.usage_metadata {
            lines.extend(usage_metadata_lines("Token Usage (final message)", usage));
        }
    }

    let tools = result.tool_messages();
    if !tools.is_empty() {
        lines.push(format!("\n--- Tools Used ({} call(s)) ---", tools.len()));
        for (name, content) in tools {
            lines.push(format!("  [{}] -> {}", name, preview(content)));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Labelled pretty JSON dump
pub fn render_json(label: &str, value: &serde_json::Value) -> String {
    let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!("--- {} ---\n{}\n", label, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentMessage;
    use crate::chat::to_ai_message;
    use serde_json::json;

    fn response() -> ResponsesResponse {
        serde_json::from_value(json!({
            "id": "resp_1",
            "model": "gpt-5.2-chat",
            "output": [
                {"type": "reasoning", "id": "rs_1", "summary": [{"type": "summary_text", "text": "Closing speed is 200 km/h."}]},
                {"type": "message", "content": [{"type": "output_text", "text": "11:12 AM"}]}
            ],
            "usage": {
                "input_tokens": 60,
                "output_tokens": 400,
                "output_tokens_details": {"reasoning_tokens": 320},
                "total_tokens": 460
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_banner() {
        let banner = banner("Example 1");
        let rule = "=".repeat(60);
        let lines: Vec<&str> = banner.lines().collect();
        assert_eq!(lines, vec!["", rule.as_str(), "  Example 1", rule.as_str()]);
    }

    #[test]
    fn test_render_response() {
        let text = render_response("Example 1 - Math Problem", &response());
        assert!(text.contains("--- Reasoning Summary ---\nClosing speed is 200 km/h."));
        assert!(text.contains("--- Answer ---\n11:12 AM"));
        assert!(text.contains("  Reasoning tokens: 320"));
        assert!(text.contains("  Answer tokens:    80"));
        assert!(text.contains("  Total tokens:     460"));
    }

    #[test]
    fn test_reasoning_without_summary() {
        let response: ResponsesResponse = serde_json::from_value(json!({
            "id": "resp_2",
            "model": "gpt-5.2-chat",
            "output": [{"type": "reasoning", "id": "rs_1", "summary": []}]
        }))
        .unwrap();
        let text = render_response("Example", &response);
        assert!(text.contains("--- Reasoning (no summary returned) ---"));
        assert!(text.contains("--- Token Usage ---\n  N/A"));
    }

    #[test]
    fn test_render_ai_message() {
        let text = render_ai_message("Example 2", &to_ai_message(&response()));
        assert!(text.contains("--- Reasoning Summary ---\nClosing speed is 200 km/h."));
        assert!(text.contains("  Reasoning tokens: 320"));
        assert!(!text.contains("Answer tokens"));
    }

    #[test]
    fn test_render_agent_result() {
        let long_output = "x".repeat(200);
        let result = AgentResult {
            messages: vec![
                AgentMessage::Human("Count".to_string()),
                AgentMessage::Tool {
                    name: "calculate".to_string(),
                    call_id: "call_1".to_string(),
                    content: long_output,
                },
                AgentMessage::Ai(to_ai_message(&response())),
            ],
        };
        let text = render_agent_result("Example 1 - Math + Tool Use", &result);
        assert!(text.contains("--- Token Usage (final message) ---"));
        assert!(text.contains("--- Tools Used (1 call(s)) ---"));
        assert!(text.contains(&format!("  [calculate] -> {}\n", "x".repeat(120))));
    }

    #[test]
    fn test_render_empty_agent_result() {
        let text = render_agent_result("Empty", &AgentResult::default());
        assert!(text.ends_with("  (no messages returned)"));
    }
}
