//! Session CLI commands: list sessions and print a session's history.
//!
//! Both commands read straight from the database; no model is contacted.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use parley_types::chat::MessageRole;

use crate::http::handlers::session::{HistoryEntry, SessionSummary};
use crate::state::AppState;

/// List every session with its title and creation time.
///
/// # Examples
///
/// ```bash
/// parley sessions
/// parley sessions --json
/// ```
pub async fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let sessions = state.chat_service.list_sessions().await?;

    if json {
        let summaries: Vec<SessionSummary> =
            sessions.into_iter().map(SessionSummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("POST /chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Session").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for session in &sessions {
        table.add_row(vec![
            Cell::new(&session.session_id).fg(Color::Yellow),
            Cell::new(truncate(&session.title, 40)).fg(Color::Cyan),
            Cell::new(session.created_at.format("%Y-%m-%d %H:%M").to_string())
                .fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print the full history of one session in insertion order.
///
/// # Examples
///
/// ```bash
/// parley history my-session
/// parley history my-session --json
/// ```
pub async fn show_history(state: &AppState, session_id: &str, json: bool) -> Result<()> {
    let messages = state.chat_service.history(session_id).await?;

    if json {
        let entries: Vec<HistoryEntry> = messages.into_iter().map(HistoryEntry::from).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No messages for session '{}'",
            style("i").blue().bold(),
            style(session_id).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    for message in &messages {
        let speaker = match message.role {
            MessageRole::User => style("you").green().bold(),
            MessageRole::Assistant => style("model").cyan().bold(),
            MessageRole::System => style("system").dim(),
        };
        println!(
            "  {} {}",
            speaker,
            style(message.timestamp.format("%H:%M:%S")).dim()
        );
        for line in message.content.lines() {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("ééééééééééé", 8), "ééééé...");
    }
}
