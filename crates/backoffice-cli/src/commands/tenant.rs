//! Tenant subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use backoffice_core::TenantId;

use crate::cli::GlobalArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct TenantCommand {
    #[command(subcommand)]
    pub command: TenantSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum TenantSubcommand {
    /// Show the selected tenant
    Show,

    /// Scope subsequent requests to a tenant
    Select {
        /// Tenant identifier
        tenant: String,
    },

    /// Stop sending a tenant header
    Clear,
}

pub fn handle(cmd: TenantCommand, global: &GlobalArgs) -> Result<()> {
    let tenants = context::tenants(global)?;

    match cmd.command {
        TenantSubcommand::Show => match tenants.current() {
            Some(tenant) => output::field("Tenant", tenant.as_str()),
            None => output::field("Tenant", "-"),
        },
        TenantSubcommand::Select { tenant } => {
            let tenant = TenantId::new(tenant).context("Invalid tenant id")?;
            tenants.select(tenant.clone()).context("Failed to store tenant")?;
            output::success(&format!("Selected tenant {}", tenant));
        }
        TenantSubcommand::Clear => {
            tenants.clear().context("Failed to clear tenant")?;
            output::success("Tenant cleared");
        }
    }

    Ok(())
}
