use clap::Parser;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::cli::app_config::{Cli, QuickCommand};
use crate::history;
use crate::history::types::HistoryEntry;
use crate::http::handler;
use crate::response::res;

pub async fn main_with_error() -> Result<(), anyhow::Error> {
    let cli: Cli = Cli::parse();
    init_tracing(&cli)?;

    match cli.quick_cmd.clone() {
        Some(QuickCommand::History) => history::command::show_history(),
        Some(QuickCommand::Replay { id }) => history::command::replay(&id, cli).await,
        None => handle_request(cli).await,
    }
}

fn init_tracing(cli: &Cli) -> Result<(), anyhow::Error> {
    let log_level = match cli.verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy()
        .add_directive("hyper=off".parse()?)
        .add_directive("hyper_util=off".parse()?);
    let subscriber = tracing_subscriber::fmt()
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_max_level(log_level)
        .with_env_filter(filter)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

/// Send, record, print, save. Shared by the plain request path and replay.
pub async fn handle_request(cli: Cli) -> Result<(), anyhow::Error> {
    let method = handler::resolve_method(&cli);
    let url = cli.url.clone().ok_or_else(|| anyhow!("URL is required"))?;

    let response = handler::http_request(&cli).await?;

    let entry = HistoryEntry {
        id: history::storage::generate_id(),
        timestamp: chrono::Utc::now(),
        method,
        url,
        status: response.status_code,
        duration: format!("{:?}", response.time),
        size: response.content_length,
        headers: cli.headers_option.clone(),
        query: cli.query_option.clone(),
        body: cli.body_option.clone(),
        body_type: Some(cli.body_type.clone()),
    };
    if let Err(e) = history::storage::append_entry(&entry) {
        warn!("Failed to add to history: {}", e);
    }

    res::print_response(&response, cli.verbosity >= 1);

    if let Some(path) = cli.file_path_option.as_ref() {
        res::save_body_to_file(&response, path)?;
    }

    Ok(())
}
