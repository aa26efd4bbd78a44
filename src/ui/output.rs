use colored::*;
use supportchat::models::{Message, Role};
use supportchat::service::{SessionDetail, SessionSummary, ToolInfo};

const PREVIEW_CHARS: usize = 60;

fn preview(text: &str) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > PREVIEW_CHARS {
        let cut: String = single_line.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        single_line
    }
}

fn role_label(role: Role) -> ColoredString {
    match role {
        Role::System => "system".dimmed(),
        Role::User => "you".cyan().bold(),
        Role::Assistant => "assistant".green().bold(),
        Role::Tool => "tool".yellow(),
    }
}

pub fn display_answer(answer: &str) {
    println!("{}", answer.trim_end());
}

pub fn display_error(message: &str) {
    eprintln!("{} {}", "Error:".red(), message);
}

pub fn display_info(message: &str) {
    eprintln!("{}", message.dimmed());
}

pub fn display_sessions(sessions: &[SessionSummary], current: &str) {
    if sessions.is_empty() {
        display_info("No sessions yet.");
        return;
    }

    for summary in sessions {
        let marker = if summary.id == current { "*" } else { " " };
        let last = summary
            .last_message
            .as_ref()
            .map(|message| preview(message.text()))
            .unwrap_or_default();
        println!(
            "{} {} {} {}",
            marker.green(),
            summary.id.cyan(),
            format!("({} messages)", summary.message_count).dimmed(),
            last
        );
    }
}

pub fn display_history(detail: &SessionDetail) {
    println!(
        "{}",
        format!("Session {} ({} messages)", detail.id, detail.message_count).dimmed()
    );
    for message in &detail.history {
        display_message(message);
    }
}

fn display_message(message: &Message) {
    println!("{}: {}", role_label(message.role), message.text());
}

pub fn display_tools(tools: &[ToolInfo]) {
    if tools.is_empty() {
        display_info("The tool server advertises no tools.");
        return;
    }

    for tool in tools {
        println!("{}", tool.name.cyan().bold());
        if !tool.description.is_empty() {
            println!("    {}", tool.description);
        }
        if let Some(properties) = tool.parameters.get("properties").and_then(|p| p.as_object()) {
            let names: Vec<&str> = properties.keys().map(String::as_str).collect();
            if !names.is_empty() {
                println!("    {}", format!("parameters: {}", names.join(", ")).dimmed());
            }
        }
    }
}

pub fn display_help() {
    let commands = [
        ("/new", "start a new session"),
        ("/reset", "clear the current session's history"),
        ("/delete", "delete the current session and start a new one"),
        ("/sessions", "list sessions"),
        ("/history", "show the current session's history"),
        ("/tools", "list the tool server's tools"),
        ("/quit", "exit"),
    ];
    for (command, help) in commands {
        eprintln!("  {:<10} {}", command.cyan(), help.dimmed());
    }
}
