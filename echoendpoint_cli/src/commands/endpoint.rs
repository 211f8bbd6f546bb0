//! Endpoint commands (new, use, open)

use crate::client::ApiClient;
use crate::config::Config;
use anyhow::{Context, Result};
use console::style;

/// Create a fresh endpoint and make it the active one
pub async fn create(config: &Config) -> Result<()> {
    use cliclack::{intro, note, outro};

    intro(style(" echoendpoint new ").on_cyan().black().to_string())?;

    let client = ApiClient::new(config.base_url()).context("Failed to create HTTP client")?;
    let spinner = cliclack::spinner();
    spinner.start("Creating endpoint...");
    let token = match client.create_endpoint().await {
        Ok(token) => token,
        Err(e) => {
            spinner.stop("Endpoint creation failed");
            return Err(e.into());
        }
    };
    spinner.stop("Endpoint created");

    save_token(&token)?;

    let details = format!(
        "{} {}\n{} {}\n{} {}",
        style("Token:    ").dim(),
        style(&token).cyan(),
        style("Webhook:  ").dim(),
        style(config.webhook_url(&token)).green().bold(),
        style("Dashboard:").dim(),
        style(config.dashboard_url(&token)).white(),
    );
    note("Your endpoint", details)?;
    outro(format!(
        "Point a webhook at it, then run {}",
        style("echoendpoint watch").cyan()
    ))?;
    Ok(())
}

/// Make an existing endpoint token the active one
pub fn use_token(token: String) -> Result<()> {
    if token.trim().is_empty() {
        anyhow::bail!("Token must not be empty");
    }
    save_token(token.trim())?;
    cliclack::log::success(format!("Now using endpoint {}", style(token.trim()).cyan()))?;
    Ok(())
}

/// Open the web dashboard of the active endpoint
pub fn open_dashboard(config: &Config) -> Result<()> {
    let url = config.dashboard_url(config.require_token()?);
    if let Err(e) = open::that(&url) {
        tracing::debug!("Failed to open browser: {}", e);
        cliclack::log::warning("Could not open browser automatically")?;
        cliclack::log::info(format!("Visit: {}", style(&url).cyan()))?;
    } else {
        cliclack::log::success(format!("Opened {}", url))?;
    }
    Ok(())
}

/// Persist the token to the config file, leaving other settings alone
fn save_token(token: &str) -> Result<()> {
    let mut stored = Config::load()?;
    stored.set_token(token.to_string());
    stored.save()
}
