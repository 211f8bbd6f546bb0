//! Canned response commands (get, set, reset)

use crate::client::ApiClient;
use crate::config::Config;
use anyhow::{Context, Result};
use console::style;
use echoendpoint_common::response::{self, ResponseConfig, ResponseConfigUpdate};
use std::fs;
use std::path::PathBuf;

/// Arguments of `response set`
#[derive(Debug, Clone)]
pub struct SetOptions {
    pub status: u16,
    pub body: Option<String>,
    pub body_file: Option<PathBuf>,
    pub content_type: String,
}

impl SetOptions {
    /// Validate into an update; runs before any network call
    pub fn into_update(self) -> Result<ResponseConfigUpdate> {
        let body = match (self.body, self.body_file) {
            (Some(_), Some(_)) => anyhow::bail!("Use either --body or --body-file, not both"),
            (Some(body), None) => body,
            (None, Some(path)) => fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, None) => response::DEFAULT_BODY.to_string(),
        };
        Ok(ResponseConfigUpdate::new(self.status, body, self.content_type)?)
    }
}

fn connect(config: &Config) -> Result<(ApiClient, String)> {
    let token = config.require_token()?.to_string();
    let client = ApiClient::new(config.base_url()).context("Failed to create HTTP client")?;
    Ok((client, token))
}

/// Show the response the endpoint currently answers with
pub async fn get(config: &Config) -> Result<()> {
    let (client, token) = connect(config)?;
    let (current, is_default) = match client.response_config(&token).await? {
        Some(current) => (current, false),
        None => (ResponseConfig::fallback(), true),
    };

    print!("{}", describe(&current, is_default));
    Ok(())
}

fn describe(config: &ResponseConfig, is_default: bool) -> String {
    let mut out = format!(
        "{:<14}{}{}\n",
        "Status",
        config.status_caption(),
        if is_default { " (default)" } else { "" }
    );
    out.push_str(&format!(
        "{:<14}{}\n",
        "Content-Type",
        config
            .content_type
            .as_deref()
            .unwrap_or(response::DEFAULT_CONTENT_TYPE)
    ));
    out.push_str(&format!("{:<14}\n{}\n", "Body", config.body_text()));
    out
}

/// Store a canned response
pub async fn set(config: &Config, options: SetOptions) -> Result<()> {
    let update = options.into_update()?;
    let (client, token) = connect(config)?;

    client.set_response_config(&token, &update).await?;

    let caption = match response::status_label(update.status_code) {
        Some(label) => format!("{} - {}", update.status_code, label),
        None => update.status_code.to_string(),
    };
    cliclack::log::success(format!(
        "Endpoint now answers {} ({})",
        style(caption).green(),
        update.content_type
    ))?;
    Ok(())
}

/// Go back to the default response
pub async fn reset(config: &Config) -> Result<()> {
    let (client, token) = connect(config)?;
    client.reset_response_config(&token).await?;
    cliclack::log::success("Response reset to default")?;
    Ok(())
}
