use anyhow::Result;
use chrono::SecondsFormat;

use crate::cli::app_config::Cli;
use crate::response::res::status_color;

use super::storage;
use super::types::HistoryEntry;

const RESET: &str = "\x1b[0m";

fn method_color(method: &str) -> &'static str {
    match method {
        "GET" => "\x1b[34m",
        "POST" => "\x1b[32m",
        "PUT" => "\x1b[33m",
        "DELETE" => "\x1b[31m",
        "HEAD" => "\x1b[36m",
        "OPTIONS" => "\x1b[35m",
        "PATCH" => "\x1b[93m",
        _ => RESET,
    }
}

/// Prints the history table, newest entries first.
pub fn show_history() -> Result<()> {
    let entries = storage::load_entries()?;
    if entries.is_empty() {
        println!("No request history found.");
        return Ok(());
    }

    println!("Request History ({} entries):\n", entries.len());
    println!(
        "{:<16} {:<25} {:<7} {:<50} {:<6} {:<10} {:<10}",
        "ID", "TIMESTAMP", "METHOD", "URL", "STATUS", "DURATION", "SIZE"
    );
    println!("{}", "-".repeat(130));

    for entry in entries.iter().rev() {
        println!(
            "{:<16} {:<25} {}{:<7}{} {:<50} {}{:<6}{} {:<10} {:<10}",
            entry.id,
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            method_color(&entry.method),
            entry.method,
            RESET,
            clip_url(&entry.url),
            status_color(entry.status),
            entry.status,
            RESET,
            entry.duration,
            entry.size,
        );
    }

    println!(
        "\nHistory file: {}",
        storage::get_history_file_path().display()
    );
    Ok(())
}

/// Re-sends a stored request; flags given on the replay command override the
/// stored inputs. The replayed request is appended to history again.
pub async fn replay(id: &str, cli: Cli) -> Result<()> {
    let entry = storage::find_by_id(id)?;
    println!("Replaying {} request to {}\n", entry.method, entry.url);
    crate::app::run::handle_request(merge(cli, &entry)).await
}

fn merge(mut cli: Cli, entry: &HistoryEntry) -> Cli {
    cli.url = Some(entry.url.clone());
    cli.method_option = Some(entry.method.clone());
    if cli.headers_option.is_none() {
        cli.headers_option = entry.headers.clone();
    }
    if cli.query_option.is_none() {
        cli.query_option = entry.query.clone();
    }
    if cli.body_option.is_none() {
        cli.body_option = entry.body.clone();
    }
    // The body type travels with the stored body unless the flag was
    // explicitly moved off its default.
    if cli.body_type == "json" {
        if let Some(body_type) = entry.body_type.clone() {
            cli.body_type = body_type;
        }
    }
    cli
}

fn clip_url(url: &str) -> String {
    if url.chars().count() > 50 {
        let clipped: String = url.chars().take(47).collect();
        format!("{}...", clipped)
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clap::Parser;

    fn entry() -> HistoryEntry {
        HistoryEntry {
            id: String::from("00ff00ff00ff00ff"),
            timestamp: Utc::now(),
            method: String::from("POST"),
            url: String::from("http://example.com/api"),
            status: 201,
            duration: String::from("12ms"),
            size: 42,
            headers: Some(String::from(r#"{"X-Token":"abc"}"#)),
            query: Some(String::from(r#"{"page":"1"}"#)),
            body: Some(String::from(r#"{"name":"demo"}"#)),
            body_type: Some(String::from("json")),
        }
    }

    #[test]
    fn replay_merge_prefers_explicit_flags() {
        let cli = Cli::parse_from(["rpost", "-H", r#"{"X-Token":"override"}"#]);
        let merged = merge(cli, &entry());

        assert_eq!(merged.url.as_deref(), Some("http://example.com/api"));
        assert_eq!(merged.method_option.as_deref(), Some("POST"));
        assert_eq!(
            merged.headers_option.as_deref(),
            Some(r#"{"X-Token":"override"}"#)
        );
        assert_eq!(merged.query_option.as_deref(), Some(r#"{"page":"1"}"#));
        assert_eq!(merged.body_option.as_deref(), Some(r#"{"name":"demo"}"#));
    }

    #[test]
    fn replay_merge_keeps_stored_body_type() {
        let cli = Cli::parse_from(["rpost"]);
        let stored = HistoryEntry {
            body_type: Some(String::from("xml")),
            ..entry()
        };
        assert_eq!(merge(cli, &stored).body_type, "xml");

        let cli = Cli::parse_from(["rpost", "-t", "text"]);
        assert_eq!(merge(cli, &stored).body_type, "text");
    }

    #[test]
    fn long_urls_are_clipped_for_the_table() {
        let url = format!("http://example.com/{}", "a".repeat(60));
        let clipped = clip_url(&url);
        assert_eq!(clipped.chars().count(), 50);
        assert!(clipped.ends_with("..."));
        assert_eq!(clip_url("http://short"), "http://short");
    }
}
