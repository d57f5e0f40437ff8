//! HTTP transport.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::{debug, instrument, trace};

use backoffice_core::error::{Error, ProtocolError, TransportError};
use backoffice_core::{ApiUrl, Result};

use crate::config::ClientConfig;
use crate::endpoints::ErrorBody;
use crate::request::{ApiResponse, PendingRequest};

/// Longest plain-text error body kept in a [`ProtocolError`] message.
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Sends prepared requests to the API and buffers the responses.
///
/// Knows nothing about sessions; credentials are already on the request
/// when it arrives here.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api: ApiUrl,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api: config.api_url.clone(),
        })
    }

    pub fn api(&self) -> &ApiUrl {
        &self.api
    }

    /// Send `request` and read the whole body.
    ///
    /// Only network failures are errors here; any HTTP status is returned
    /// as a response for the caller to classify.
    #[instrument(skip_all, fields(method = %request.method(), path = request.path()))]
    pub async fn send(&self, request: &PendingRequest) -> Result<ApiResponse> {
        let url = self.api.endpoint(request.path());
        debug!(%url, "API request");

        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(request.headers().clone());
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport_error)?;
        trace!(%status, bytes = body.len(), "API response");

        Ok(ApiResponse::new(status, headers, body.to_vec()))
    }
}

/// Map a reqwest failure into the crate's transport taxonomy.
pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let error = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else if err.is_builder() {
        TransportError::Request {
            message: err.to_string(),
        }
    } else if err.is_decode() || err.is_body() {
        TransportError::Decode {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    error.into()
}

/// Build a [`ProtocolError`] from a non-success response.
pub(crate) fn protocol_error(response: &ApiResponse) -> ProtocolError {
    let status = response.status().as_u16();

    if let Ok(body) = serde_json::from_slice::<ErrorBody>(response.bytes()) {
        let (error, message) = body.into_message();
        return ProtocolError::new(status, error, message);
    }

    let text = response.text();
    let text = text.trim();
    let message = (!text.is_empty()).then(|| truncate(text, MAX_ERROR_BODY_LENGTH));
    ProtocolError::new(status, None, message)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
