//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use backoffice_http::DEFAULT_API_URL;

use crate::commands::auth::AuthCommand;
use crate::commands::lang::LangCommand;
use crate::commands::request::RequestArgs;
use crate::commands::tenant::TenantCommand;

/// Command-line client for the back-office API.
#[derive(Parser, Debug)]
#[command(name = "backoffice")]
#[command(author, version = env!("BACKOFFICE_VERSION"), about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// API base URL
    #[arg(long, env = "BACKOFFICE_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Directory holding the session, tenant and language
    #[arg(long, env = "BACKOFFICE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session operations
    Auth(AuthCommand),

    /// Tenant selection
    Tenant(TenantCommand),

    /// UI language preference
    Lang(LangCommand),

    /// Send an authenticated request to the API
    Request(RequestArgs),
}
