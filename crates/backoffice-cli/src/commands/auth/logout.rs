//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::GlobalArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, global: &GlobalArgs) -> Result<()> {
    let client = context::client(global)?;

    client
        .logout()
        .await
        .context("Failed to clear stored session")?;

    output::success("Logged out");
    Ok(())
}
