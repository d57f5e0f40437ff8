use reqwest::header::{AUTHORIZATION, HeaderValue};
use tracing::warn;

use backoffice_core::TokenStore;

use super::RequestStage;
use crate::request::PendingRequest;

/// Attaches `Authorization: Bearer <access token>` when a session exists.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    tokens: TokenStore,
}

impl BearerAuth {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }
}

impl RequestStage for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn apply(&self, request: &mut PendingRequest) {
        let headers = request.headers_mut();
        headers.remove(AUTHORIZATION);

        let Some(token) = self.tokens.access_token() else {
            return;
        };
        match HeaderValue::from_str(&format!("Bearer {}", token.as_str())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Access token is not a valid header value; sending without it"),
        }
    }
}
