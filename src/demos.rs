//! Demonstration suites
//!
//! Three fixed sets of prompts: direct Responses API calls, the same calls
//! through the chat layer, and a tool-using agent. Each suite writes its
//! report to the given writer as it goes.

use crate::agent::{Agent, Tool};
use crate::chat::{ChatMessage, ChatModel};
use crate::core::client::ResponsesApi;
use crate::models::responses::{
    InputItem, OutputItem, Reasoning, ReasoningEffort, ReasoningSummary, ResponsesInput,
    ResponsesRequest, Role, StreamEvent, Verbosity,
};
use crate::report;
use crate::tools::{Calculate, CountCharacters};
use anyhow::{Result, bail};
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;
use tracing::warn;

const MATH_TUTOR_PROMPT: &str = "You are a helpful math tutor. Show your work step by step.";

const TRAIN_PROBLEM: &str = "A train leaves Station A at 9:00 AM traveling at 80 km/h. \
    Another train leaves Station B (320 km away) at 10:00 AM \
    traveling toward Station A at 120 km/h. \
    At what time do they meet, and how far from Station A?";

const ENGINEER_PROMPT: &str = "You are a senior software engineer. Think carefully before answering.";

const BRACKETS_QUESTION: &str = "Write a Python function that determines if a given string \
    of parentheses, brackets, and braces is balanced. \
    Explain your approach first, then provide the code.";

const STRAWBERRY_QUESTION: &str = "How many r's are in the word 'strawberry'?";

const AGENT_MATH_PROMPT: &str = "You are a helpful math tutor. When you need to compute a \
    numerical result, use the 'calculate' tool. Show your reasoning.";

const AGENT_COUNT_PROMPT: &str = "You are a meticulous assistant. When asked how often a \
    character occurs in a text, use the 'count_characters' tool instead of counting yourself.";

const COUNT_QUESTION: &str = "How many times does the letter 'r' appear in 'strawberry', \
    and how many times does 's' appear in 'Mississippi'?";

const AGENT_LOGIC_PROMPT: &str = "You are a logic expert. Reason carefully and state the answer clearly.";

const LOGIC_PUZZLE: &str = "On an island, knights always tell the truth and knaves always lie. \
    A says: 'B is a knave.' B says: 'A and I are the same kind.' \
    What are A and B?";

/// Which suite to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    Responses,
    Chat,
    Agent,
    All,
}

impl Suite {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "responses" | "vanilla" => Some(Suite::Responses),
            "chat" => Some(Suite::Chat),
            "agent" => Some(Suite::Agent),
            "all" => Some(Suite::All),
            _ => None,
        }
    }
}

/// Reasoning configuration used by every demo: medium effort is the only
/// value the chat deployment accepts
pub fn demo_reasoning(summary: ReasoningSummary) -> Reasoning {
    Reasoning::new(ReasoningEffort::Medium, summary)
}

fn title(out: &mut dyn Write, suffix: &str) -> Result<()> {
    writeln!(out, "Azure AI Foundry - GPT-5.2-chat Reasoning Examples{}", suffix)?;
    writeln!(out, "{}", report::rule())?;
    Ok(())
}

fn developer_request(deployment: &str, system: &str, user: &str) -> ResponsesRequest {
    ResponsesRequest::new(
        deployment,
        ResponsesInput::Items(vec![
            InputItem::message(Role::Developer, system),
            InputItem::message(Role::User, user),
        ]),
    )
    .with_reasoning(demo_reasoning(ReasoningSummary::Detailed))
}

/// Render a streamed response as it arrives
async fn stream_response(
    api: &dyn ResponsesApi,
    label: &str,
    request: ResponsesRequest,
    out: &mut dyn Write,
) -> Result<()> {
    writeln!(out, "{}", report::banner(label))?;

    let mut stream = api.create_response_stream(request).await?;
    let mut in_summary = false;
    let mut in_answer = false;
    let mut completed = None;

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::ReasoningSummaryDelta { delta } => {
                if !in_summary {
                    writeln!(out, "\n--- Reasoning Summary ---")?;
                    in_summary = true;
                }
                write!(out, "{}", delta)?;
            }
            StreamEvent::ReasoningSummaryPartDone => writeln!(out)?,
            StreamEvent::OutputTextDelta { delta } => {
                if !in_answer {
                    writeln!(out, "\n--- Answer ---")?;
                    in_answer = true;
                }
                write!(out, "{}", delta)?;
            }
            StreamEvent::OutputItemDone {
                item: OutputItem::Reasoning(reasoning),
            } if reasoning.summary_texts().is_empty() => {
                writeln!(out, "\n--- Reasoning (no summary returned) ---")?;
            }
            StreamEvent::OutputItemDone { .. } => {}
            StreamEvent::Completed { response } => completed = Some(response),
            StreamEvent::Failed { response } => {
                let reason = response
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "no error details".to_string());
                bail!("Response {} failed: {}", response.id, reason);
            }
            StreamEvent::Error { message } => bail!("Stream error: {}", message),
            StreamEvent::Other => {}
        }
        out.flush()?;
    }

    if in_answer {
        writeln!(out)?;
    }
    let Some(response) = completed else {
        warn!("stream ended before completion");
        bail!("Stream ended before the response completed");
    };
    writeln!(
        out,
        "{}\n",
        report::usage_section(response.usage.as_ref()).join("\n")
    )?;
    Ok(())
}

/// Direct Responses API calls
pub async fn run_responses(
    api: &dyn ResponsesApi,
    deployment: &str,
    stream: bool,
    out: &mut dyn Write,
) -> Result<()> {
    title(out, "")?;

    let label = "Example 1 - Math Problem (reasoning + summary)";
    let request = developer_request(deployment, MATH_TUTOR_PROMPT, TRAIN_PROBLEM);
    if stream {
        stream_response(api, label, request, out).await?;
    } else {
        let response = api.create_response(&request).await?;
        writeln!(out, "{}", report::render_response(label, &response))?;
    }

    let request = developer_request(deployment, ENGINEER_PROMPT, BRACKETS_QUESTION)
        .with_verbosity(Verbosity::Medium);
    let response = api.create_response(&request).await?;
    writeln!(
        out,
        "{}",
        report::render_response("Example 2 - Balanced Brackets (reasoning + summary)", &response)
    )?;

    let request = ResponsesRequest::new(
        deployment,
        ResponsesInput::Text(STRAWBERRY_QUESTION.to_string()),
    )
    .with_reasoning(demo_reasoning(ReasoningSummary::Auto));
    let raw = api.create_response_raw(&request).await?;
    writeln!(out, "{}", report::banner("Example 3 - Raw JSON Response"))?;
    writeln!(out, "{}", serde_json::to_string_pretty(&raw)?)?;

    writeln!(out, "\nDone.")?;
    Ok(())
}

/// The same prompts through the chat layer
pub async fn run_chat(model: &ChatModel, out: &mut dyn Write) -> Result<()> {
    title(out, " (Chat Model)")?;

    let reply = model
        .invoke(&[
            ChatMessage::system(MATH_TUTOR_PROMPT),
            ChatMessage::human(TRAIN_PROBLEM),
        ])
        .await?;
    writeln!(
        out,
        "{}",
        report::render_ai_message("Example 1 - Math Problem (reasoning + summary)", &reply)
    )?;

    let reply = model
        .invoke(&[
            ChatMessage::system(ENGINEER_PROMPT),
            ChatMessage::human(BRACKETS_QUESTION),
        ])
        .await?;
    writeln!(
        out,
        "{}",
        report::render_ai_message("Example 2 - Balanced Brackets (reasoning + summary)", &reply)
    )?;

    let reply = model.invoke(&[ChatMessage::human(STRAWBERRY_QUESTION)]).await?;
    writeln!(
        out,
        "{}",
        report::render_ai_message("Example 3 - Strawberry Question (reasoning metadata)", &reply)
    )?;
    let usage = serde_json::to_value(&reply.usage_metadata)?;
    writeln!(out, "{}", report::render_json("Full usage_metadata", &usage))?;
    writeln!(
        out,
        "{}",
        report::render_json("Full response_metadata", &reply.response_metadata)
    )?;

    writeln!(out, "\nDone.")?;
    Ok(())
}

/// Tool-using agent runs
pub async fn run_agent(model: &ChatModel, out: &mut dyn Write) -> Result<()> {
    title(out, " (Agent)")?;

    let math_tools: Vec<Box<dyn Tool>> = vec![Box::new(Calculate)];
    let agent = Agent::new(model.clone(), math_tools, AGENT_MATH_PROMPT);
    let result = agent
        .invoke(&format!("{} Use the calculate tool to verify your math.", TRAIN_PROBLEM))
        .await?;
    writeln!(
        out,
        "{}",
        report::render_agent_result("Example 1 - Math + Tool Use (Agent)", &result)
    )?;

    let count_tools: Vec<Box<dyn Tool>> = vec![Box::new(CountCharacters)];
    let agent = Agent::new(model.clone(), count_tools, AGENT_COUNT_PROMPT);
    let result = agent.invoke(COUNT_QUESTION).await?;
    writeln!(
        out,
        "{}",
        report::render_agent_result("Example 2 - Character Counting (Agent)", &result)
    )?;

    let agent = Agent::new(model.clone(), Vec::new(), AGENT_LOGIC_PROMPT).with_max_rounds(0);
    let result = agent.invoke(LOGIC_PUZZLE).await?;
    writeln!(
        out,
        "{}",
        report::render_agent_result("Example 3 - Pure Reasoning (Agent)", &result)
    )?;

    writeln!(out, "\nDone.")?;
    Ok(())
}

/// Run the selected suite against one API client
pub async fn run(
    suite: Suite,
    api: Arc<dyn ResponsesApi>,
    deployment: &str,
    stream: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let model = ChatModel::new(
        api.clone(),
        deployment,
        demo_reasoning(ReasoningSummary::Auto),
    );

    match suite {
        Suite::Responses => run_responses(api.as_ref(), deployment, stream, out).await,
        Suite::Chat => run_chat(&model, out).await,
        Suite::Agent => run_agent(&model, out).await,
        Suite::All => {
            run_responses(api.as_ref(), deployment, stream, out).await?;
            writeln!(out)?;
            run_chat(&model, out).await?;
            writeln!(out)?;
            run_agent(&model, out).await
        }
    }
}
