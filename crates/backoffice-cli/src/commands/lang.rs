//! Language preference subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use backoffice_core::Language;

use crate::cli::GlobalArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct LangCommand {
    #[command(subcommand)]
    pub command: LangSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum LangSubcommand {
    /// Show the current language
    Show,

    /// Change the language
    Set {
        /// Language tag, e.g. pt-BR or en
        language: String,
    },
}

pub fn handle(cmd: LangCommand, global: &GlobalArgs) -> Result<()> {
    let preferences = context::preferences(global)?;

    match cmd.command {
        LangSubcommand::Show => output::field("Language", preferences.language().as_str()),
        LangSubcommand::Set { language } => {
            let language = Language::new(language).context("Invalid language")?;
            preferences
                .set_language(language.clone())
                .context("Failed to store language")?;
            output::success(&format!("Language set to {}", language.as_str()));
        }
    }

    Ok(())
}
