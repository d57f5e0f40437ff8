//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use backoffice_core::error::{AuthError, Error};
use backoffice_core::{Credentials, Session};

use crate::cli::GlobalArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "BACKOFFICE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, global: &GlobalArgs) -> Result<()> {
    let client = context::client(global)?;
    let credentials = Credentials::new(&args.email, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let session = match client.login(&credentials).await {
        Ok(session) => session,
        Err(Error::Auth(AuthError::SecondFactorRequired)) => {
            output::success("Password accepted");
            println!(
                "Finish with: backoffice auth verify-2fa --email {} --code <CODE>",
                args.email
            );
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to login"),
    };

    output::success("Logged in successfully");
    println!();
    print_session(&session);

    Ok(())
}

pub(super) fn print_session(session: &Session) {
    if let Some(name) = session.user().and_then(|u| u.display_name()) {
        output::field("User", &name);
    }
    output::list("Roles", session.roles());
    output::list("Permissions", session.permissions());
}
