//! Wiring between CLI options and the API client.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use backoffice_core::{
    ApiUrl, EventBus, Navigator, Preferences, Route, Storage, TenantContext, TokenStore,
};
use backoffice_file::FileStorage;
use backoffice_http::{ApiClient, ClientConfig};

use crate::cli::GlobalArgs;
use crate::output;

/// Prints redirects instead of navigating.
#[derive(Debug, Clone, Copy)]
struct CliNavigator;

impl Navigator for CliNavigator {
    fn navigate(&self, route: Route) {
        match route {
            Route::Login => {
                output::error("Session expired. Run 'backoffice auth login' to sign in again.")
            }
            Route::Forbidden => output::error("Access denied for this resource."),
        }
        tracing::debug!(%route, "Redirect requested");
    }
}

/// The data directory: `--data-dir`, or the platform data directory.
fn data_dir(global: &GlobalArgs) -> Result<PathBuf> {
    let dir = match &global.data_dir {
        Some(dir) => dir.clone(),
        None => ProjectDirs::from("", "", "backoffice")
            .context("Could not determine data directory")?
            .data_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir).context("Failed to create data directory")?;
    Ok(dir)
}

pub fn storage(global: &GlobalArgs) -> Result<Arc<dyn Storage>> {
    Ok(Arc::new(FileStorage::in_dir(data_dir(global)?)))
}

/// Build a client over the file-backed session.
pub fn client(global: &GlobalArgs) -> Result<ApiClient> {
    let api_url = ApiUrl::new(&global.api_url).context("Invalid API URL")?;
    let config = ClientConfig::new(api_url).with_timeout(Duration::from_secs(global.timeout));

    ApiClient::builder(config)
        .storage(storage(global)?)
        .navigator(Arc::new(CliNavigator))
        .build()
        .context("Failed to restore session")
}

/// Session state without a network client.
pub fn tokens(global: &GlobalArgs) -> Result<TokenStore> {
    TokenStore::restore(storage(global)?, EventBus::new()).context("Failed to restore session")
}

pub fn tenants(global: &GlobalArgs) -> Result<TenantContext> {
    Ok(TenantContext::new(storage(global)?, EventBus::new()))
}

pub fn preferences(global: &GlobalArgs) -> Result<Preferences> {
    Ok(Preferences::new(storage(global)?, EventBus::new()))
}
