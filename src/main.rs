mod ui;

use clap::Parser;
use colored::*;
use futures::StreamExt;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use supportchat::api::OpenAiGateway;
use supportchat::cli::Args;
use supportchat::config::Config;
use supportchat::mcp::ToolClient;
use supportchat::orchestrator::ChatOptions;
use supportchat::service::{ChatService, TurnOutput};
use supportchat::{logging, Result};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            ui::output::display_error(&e.to_string());
            process::exit(1);
        }
    };

    let tools = match ToolClient::new(&config.mcp_server_url, config.mcp_timeout) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            ui::output::display_error(&e.to_string());
            process::exit(1);
        }
    };

    let service = match build_service(&config, Arc::clone(&tools)) {
        Ok(service) => service,
        Err(e) => {
            ui::output::display_error(&e.to_string());
            process::exit(1);
        }
    };

    let session_id = args
        .session
        .clone()
        .unwrap_or_else(ChatService::new_session_id);

    let outcome = match args.one_shot_message() {
        Some(message) => run_turn(&service, &session_id, &message, args.stream).await,
        None => run_repl(&service, session_id, args.stream).await,
    };

    tools.close();

    if let Err(e) = outcome {
        ui::output::display_error(&e.to_string());
        process::exit(1);
    }
}

fn build_service(config: &Config, tools: Arc<ToolClient>) -> Result<ChatService> {
    let gateway = OpenAiGateway::new(
        &config.api_key,
        &config.api_base_url,
        &config.model,
        config.llm_timeout,
    )?;
    debug!(
        model = %config.model,
        endpoint = gateway.endpoint(),
        tool_server = %config.mcp_server_url,
        "configuration loaded"
    );

    let options = ChatOptions {
        temperature: config.temperature,
        max_tokens: Some(config.max_tokens),
        max_tool_iterations: config.max_tool_iterations,
    };

    Ok(ChatService::new(
        Arc::new(gateway),
        tools,
        config.system_prompt.clone(),
        options,
    ))
}

async fn run_turn(service: &ChatService, session_id: &str, message: &str, stream: bool) -> Result<()> {
    let (_, output) = service
        .start_or_continue_turn(Some(session_id), message, stream)
        .await?;

    match output {
        TurnOutput::Text(answer) => ui::output::display_answer(&answer),
        TurnOutput::Stream(mut fragments) => {
            while let Some(fragment) = fragments.next().await {
                print!("{}", fragment?);
                io::stdout().flush()?;
            }
            println!();
        }
    }

    Ok(())
}

async fn run_repl(service: &ChatService, mut session_id: String, stream: bool) -> Result<()> {
    eprintln!(
        "{}",
        format!("Session {}. Type /help for commands.", session_id).dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/help" => ui::output::display_help(),
            "/new" => {
                session_id = ChatService::new_session_id();
                ui::output::display_info(&format!("Started session {}", session_id));
            }
            "/reset" => {
                service.reset_session(&session_id).await;
                ui::output::display_info("Conversation cleared.");
            }
            "/delete" => {
                service.delete_session(&session_id);
                session_id = ChatService::new_session_id();
                ui::output::display_info(&format!("Session deleted. Started session {}", session_id));
            }
            "/sessions" => ui::output::display_sessions(&service.list_sessions(), &session_id),
            "/history" => match service.get_session_detail(&session_id) {
                Ok(detail) => ui::output::display_history(&detail),
                Err(e) => ui::output::display_info(&e.to_string()),
            },
            "/tools" => match service.list_tools().await {
                Ok(tools) => ui::output::display_tools(&tools),
                Err(e) => ui::output::display_error(&e.to_string()),
            },
            command if command.starts_with('/') => {
                ui::output::display_error(&format!("Unknown command {}", command));
            }
            message => {
                // A failed turn leaves the session usable.
                if let Err(e) = run_turn(service, &session_id, message, stream).await {
                    ui::output::display_error(&e.to_string());
                }
            }
        }
    }

    Ok(())
}
