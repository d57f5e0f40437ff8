//! Two-factor verification command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::GlobalArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct Verify2faArgs {
    /// Account email used at login
    #[arg(long)]
    pub email: String,

    /// Code from the authenticator app
    #[arg(long)]
    pub code: String,
}

pub async fn run(args: Verify2faArgs, global: &GlobalArgs) -> Result<()> {
    let client = context::client(global)?;

    let session = client
        .verify_second_factor(&args.email, &args.code)
        .await
        .context("Failed to verify code")?;

    output::success("Logged in successfully");
    println!();
    super::login::print_session(&session);

    Ok(())
}
