//! Whoami command implementation.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use backoffice_core::User;

use crate::cli::GlobalArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the session as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct WhoamiOutput<'a> {
    user: Option<&'a User>,
    roles: &'a BTreeSet<String>,
    permissions: &'a BTreeSet<String>,
    expires_at: Option<DateTime<Utc>>,
    tenant: Option<String>,
}

pub fn run(args: WhoamiArgs, global: &GlobalArgs) -> Result<()> {
    let session = context::tokens(global)?.snapshot();
    anyhow::ensure!(
        session.is_authenticated(),
        "No active session. Run 'backoffice auth login' first."
    );
    let tenant = context::tenants(global)?.current().map(|t| t.to_string());

    if args.json {
        return output::json_pretty(&WhoamiOutput {
            user: session.user(),
            roles: session.roles(),
            permissions: session.permissions(),
            expires_at: session.expires_at(),
            tenant,
        });
    }

    let name = session.user().and_then(User::display_name);
    output::field("User", name.as_deref().unwrap_or("-"));
    output::list("Roles", session.roles());
    output::list("Permissions", session.permissions());
    output::field("Tenant", tenant.as_deref().unwrap_or("-"));
    if let Some(expires_at) = session.expires_at() {
        let label = expires_at.to_rfc3339();
        if expires_at <= Utc::now() {
            output::field("Expires", &format!("{} {}", label, "(expired)".yellow()));
        } else {
            output::field("Expires", &label);
        }
    }

    Ok(())
}
