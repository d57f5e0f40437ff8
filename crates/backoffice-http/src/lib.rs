//! backoffice-http - Authenticated HTTP client for the back-office API.
//!
//! [`ApiClient`] runs every request through a [`RequestPipeline`] that
//! attaches the bearer token and tenant header, and handles the response
//! side: a 401 triggers one shared refresh and a single replay, a 403
//! redirects to the forbidden view.
//!
//! ```no_run
//! use backoffice_core::{ApiUrl, Credentials};
//! use backoffice_http::{ApiClient, ClientConfig};
//!
//! # async fn example() -> backoffice_core::Result<()> {
//! let client = ApiClient::builder(ClientConfig::new(ApiUrl::new("https://admin.example.com/api/v1")?))
//!     .build()?;
//! client.login(&Credentials::new("a@b.com", "secret")).await?;
//! let users: serde_json::Value = client.get("/users").await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
pub mod config;
pub mod endpoints;
pub mod pipeline;
mod refresh;
pub mod request;
mod transport;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use pipeline::{RequestPipeline, RequestStage, ResponseAction};
pub use refresh::RefreshOutcome;
pub use request::{ApiResponse, PendingRequest};
pub use transport::HttpTransport;

pub use reqwest::{Method, StatusCode};
