//! Raw API request command.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde_json::Value;

use backoffice_http::{Method, PendingRequest};

use crate::cli::GlobalArgs;
use crate::{context, output};

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path relative to the API base URL, e.g. /users
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", value_name = "KEY=VALUE")]
    pub query: Vec<String>,
}

pub async fn run(args: RequestArgs, global: &GlobalArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("Invalid HTTP method: {}", args.method))?;

    let mut request = PendingRequest::new(method, args.path);
    for pair in &args.query {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Query parameter must be KEY=VALUE: {}", pair))?;
        request = request.query(key, value);
    }
    if let Some(data) = &args.data {
        let body: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.json(&body)?;
    }

    let client = context::client(global)?;
    let response = client.execute(request).await.context("Request failed")?;

    match serde_json::from_slice::<Value>(response.bytes()) {
        Ok(body) => output::json_pretty(&body)?,
        Err(_) if response.bytes().is_empty() => {
            output::success(&format!("{}", response.status()))
        }
        Err(_) => println!("{}", response.text()),
    }

    Ok(())
}
