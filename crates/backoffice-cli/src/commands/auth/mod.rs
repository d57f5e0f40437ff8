//! Session subcommands.

mod can;
mod login;
mod logout;
mod refresh_token;
mod verify_2fa;
mod whoami;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::GlobalArgs;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Sign in and store the session
    Login(login::LoginArgs),

    /// Complete a login that asked for a two-factor code
    #[command(name = "verify-2fa")]
    Verify2fa(verify_2fa::Verify2faArgs),

    /// Sign out and clear the stored session
    Logout(logout::LogoutArgs),

    /// Display the active session
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for new tokens
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Check whether the session may enter a view
    Can(can::CanArgs),
}

pub async fn handle(cmd: AuthCommand, global: &GlobalArgs) -> Result<()> {
    match cmd.command {
        AuthSubcommand::Login(args) => login::run(args, global).await,
        AuthSubcommand::Verify2fa(args) => verify_2fa::run(args, global).await,
        AuthSubcommand::Logout(args) => logout::run(args, global).await,
        AuthSubcommand::Whoami(args) => whoami::run(args, global),
        AuthSubcommand::RefreshToken(args) => refresh_token::run(args, global).await,
        AuthSubcommand::Can(args) => can::run(args, global),
    }
}
