//! Captured request commands (list, show, clear, export)

use crate::client::{ApiClient, ClientError};
use crate::config::Config;
use crate::inbox::{format_timestamp, DetailView};
use anyhow::{Context, Result};
use console::style;
use echoendpoint_common::{constants, RequestId};
use std::fs;
use std::path::{Path, PathBuf};

fn connect(config: &Config) -> Result<(ApiClient, String)> {
    let token = config.require_token()?.to_string();
    let client = ApiClient::new(config.base_url()).context("Failed to create HTTP client")?;
    Ok((client, token))
}

/// Print one page of captured requests
pub async fn list(config: &Config, limit: Option<u32>, offset: u32) -> Result<()> {
    let (client, token) = connect(config)?;
    let limit = limit.unwrap_or(config.page_limit);
    let items = client.list_requests(&token, limit, offset).await?;

    if items.is_empty() {
        println!("No requests captured yet.");
        println!();
        println!("Send one to: {}", config.webhook_url(&token));
        return Ok(());
    }

    println!("{:<10} {:<20} {:<8} {}", "ID", "RECEIVED", "METHOD", "PATH");
    println!("{}", "-".repeat(70));

    for item in &items {
        println!(
            "{:<10} {:<20} {:<8} {}",
            item.id.to_string(),
            format_timestamp(item.received_at.as_ref()),
            item.display_method(),
            item.display_path()
        );
    }

    if items.len() as u32 == limit {
        println!();
        println!("{}", more_hint(offset, limit));
    }

    Ok(())
}

/// Print the detail of one request
pub async fn show(
    config: &Config,
    id: RequestId,
    raw: bool,
    save_body: Option<PathBuf>,
) -> Result<()> {
    let (client, _token) = connect(config)?;
    let detail = match client.request_detail(&id).await {
        Ok(detail) => detail,
        Err(ClientError::NotFound { .. }) => anyhow::bail!("Request {} not found", id),
        Err(e) => return Err(e.into()),
    };

    print!("{}", render_detail(&DetailView::derive(&detail), raw));

    if let Some(path) = save_body {
        let bytes = detail.body_bytes().context("Stored body could not be decoded")?;
        fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write body to {}", path.display()))?;
        println!();
        println!("{}", saved_body_message(bytes.len(), detail.truncated, &path));
    }

    Ok(())
}

fn more_hint(offset: u32, limit: u32) -> String {
    format!(
        "More may be available: echoendpoint list --offset {}",
        offset.saturating_add(limit)
    )
}

fn saved_body_message(written: usize, truncated: bool, path: &Path) -> String {
    let mut message = format!("Saved {} bytes to {}", written, path.display());
    if truncated {
        message.push_str(&format!(
            " (the backend keeps at most {} bytes of a body)",
            constants::MAX_STORED_BODY_BYTES
        ));
    }
    message
}

/// Terminal rendering of a detail view
pub fn render_detail(view: &DetailView, raw: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        style(&view.method).yellow().bold(),
        style(&view.path).bold()
    ));
    out.push_str(&format!("{}\n\n", style(&view.meta).dim()));
    out.push_str(&format!("{}\n{}\n\n", style("Headers").dim().bold(), view.headers));
    out.push_str(&format!("{}\n{}\n\n", style("Query").dim().bold(), view.query));
    out.push_str(&format!(
        "{}  {}\n{}\n",
        style(if raw { "Body (raw)" } else { "Body" }).dim().bold(),
        style(&view.size_caption).dim(),
        if raw { &view.body_raw } else { &view.body_preview }
    ));
    out
}

/// Delete every captured request after confirmation
pub async fn clear(config: &Config, yes: bool) -> Result<()> {
    use cliclack::{confirm, intro, outro, outro_cancel};

    let (client, token) = connect(config)?;

    intro(style(" echoendpoint clear ").on_cyan().black().to_string())?;

    if !yes {
        let confirmed = confirm(format!(
            "Delete all captured requests for {}?",
            style(&token).cyan()
        ))
        .initial_value(false)
        .interact()?;

        if !confirmed {
            outro_cancel("Nothing was deleted")?;
            return Ok(());
        }
    }

    let spinner = cliclack::spinner();
    spinner.start("Clearing requests...");
    match client.clear_requests(&token).await {
        Ok(()) => {
            spinner.stop("Requests cleared");
            outro("Inbox is empty")?;
            Ok(())
        }
        Err(e) => {
            spinner.stop("Clear failed");
            Err(e.into())
        }
    }
}

/// Save the JSON export of every captured request
pub async fn export(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let (client, token) = connect(config)?;
    let path = output.unwrap_or_else(|| default_export_path(&token));

    let bytes = client.export_requests(&token).await?;
    fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    println!(
        "Exported {} bytes to {}",
        bytes.len(),
        style(path.display()).cyan()
    );
    Ok(())
}

fn default_export_path(token: &str) -> PathBuf {
    PathBuf::from(format!("requests-{}.json", token))
}
