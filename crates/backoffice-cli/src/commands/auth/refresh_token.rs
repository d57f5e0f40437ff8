//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::GlobalArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(_args: RefreshTokenArgs, global: &GlobalArgs) -> Result<()> {
    let client = context::client(global)?;
    anyhow::ensure!(
        client.tokens().is_authenticated(),
        "No active session. Run 'backoffice auth login' first."
    );

    eprintln!("{}", "Refreshing session...".dimmed());

    client
        .refresh()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");
    if let Some(expires_at) = client.session().expires_at() {
        output::field("Expires", &expires_at.to_rfc3339());
    }

    Ok(())
}
