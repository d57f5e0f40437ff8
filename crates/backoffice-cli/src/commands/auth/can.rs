//! Route guard check.

use anyhow::{Result, bail};
use clap::Args;

use backoffice_core::{GuardDecision, RouteGuard, RouteRequirement};

use crate::cli::GlobalArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct CanArgs {
    /// Permission the view requires; omit to only require a session
    pub permission: Option<String>,

    /// Path of the view being entered
    #[arg(long, default_value = "/")]
    pub path: String,
}

pub fn run(args: CanArgs, global: &GlobalArgs) -> Result<()> {
    let requirement = match args.permission {
        Some(permission) => RouteRequirement::permission(permission),
        None => RouteRequirement::authenticated(),
    };
    let guard = RouteGuard::new(context::tokens(global)?);

    match guard.check(&args.path, &requirement) {
        GuardDecision::Allow => {
            output::success("Allowed");
            Ok(())
        }
        GuardDecision::RedirectLogin { redirect } => {
            bail!("Not signed in: redirect to /login?redirect={}", redirect)
        }
        GuardDecision::RedirectForbidden => bail!("Forbidden: redirect to /forbidden"),
    }
}
