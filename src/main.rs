//! Azure AI Foundry reasoning examples
//!
//! Runs fixed demonstration prompts against a reasoning-enabled deployment
//! through the Responses API and prints reasoning summaries, answers and
//! token usage, including the hidden reasoning-token count.

mod agent;
mod chat;
mod core;
mod demos;
mod models;
mod report;
mod tools;

use crate::core::client::ResponsesClient;
use crate::core::config::Config;
use crate::core::logging::init_logging;
use crate::demos::Suite;
use std::sync::Arc;
use tracing::{error, info};

/// Parsed command-line arguments
#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    suite: Suite,
    stream: bool,
    config_path: Option<String>,
    help: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        suite: Suite::Responses,
        stream: false,
        config_path: None,
        help: false,
    };
    let mut suite_seen = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => parsed.help = true,
            "--stream" => parsed.stream = true,
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                parsed.config_path = Some(path);
            }
            other if !other.starts_with('-') && !suite_seen => {
                parsed.suite =
                    Suite::parse(other).ok_or_else(|| format!("Unknown suite: {}", other))?;
                suite_seen = true;
            }
            other => return Err(format!("Unexpected argument: {}", other)),
        }
    }

    Ok(parsed)
}

#[tokio::main]
async fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!();
            print_help();
            std::process::exit(2);
        }
    };

    if args.help {
        print_help();
        return;
    }

    dotenv::dotenv().ok();

    let config = match &args.config_path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    };
    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level);
    info!(
        endpoint = %config.endpoint,
        base_url = %config.base_url,
        deployment = %config.deployment,
        timeout = config.request_timeout,
        "configuration loaded"
    );

    let client = match ResponsesClient::new(
        config.api_key.clone(),
        config.base_url.clone(),
        config.request_timeout,
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut stdout = std::io::stdout();
    if let Err(e) = demos::run(args.suite, client, &config.deployment, args.stream, &mut stdout).await
    {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Print help message
fn print_help() {
    println!("Azure AI Foundry reasoning examples v0.1.0");
    println!();
    println!("Usage: foundry-reasoning [SUITE] [OPTIONS]");
    println!();
    println!("Suites:");
    println!("  responses   Direct Responses API calls (default)");
    println!("  chat        Chat-model layer with content blocks and usage metadata");
    println!("  agent       Tool-calling agent (calculate, count_characters)");
    println!("  all         Run every suite");
    println!();
    println!("Options:");
    println!("  --stream         Stream the first responses example");
    println!("  --config <PATH>  Read settings from a TOML file");
    println!("  --help           Display this help message");
    println!();
    println!("Environment variables (a .env file is loaded if present):");
    println!("  AZURE_OPENAI_ENDPOINT   - Resource or project endpoint (required)");
    println!("  AZURE_OPENAI_API_KEY    - API key (required)");
    println!("  AZURE_OPENAI_DEPLOYMENT - Deployment name (default: gpt-5.2-chat)");
    println!("  CONFIG_PATH             - TOML configuration file");
    println!("  LOG_LEVEL               - Logging level (default: info)");
    println!("  REQUEST_TIMEOUT         - Request timeout in seconds (default: 120)");
}
