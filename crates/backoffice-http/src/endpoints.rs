//! Auth endpoint paths and wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use backoffice_core::SessionData;

pub const LOGIN: &str = "/auth/login";
pub const VERIFY_2FA: &str = "/auth/verify-2fa";
pub const REFRESH: &str = "/auth/refresh";
pub const LOGOUT: &str = "/auth/logout";

/// Request body for [`LOGIN`].
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Request body for [`VERIFY_2FA`].
#[derive(Serialize)]
pub struct SecondFactorRequest<'a> {
    pub email: &'a str,
    pub code: &'a str,
}

/// Request body for [`REFRESH`].
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Token payload returned by login, verification and refresh.
#[derive(Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub requires_2fa: bool,
}

impl From<TokenResponse> for SessionData {
    fn from(response: TokenResponse) -> Self {
        SessionData::new(response.access_token, response.refresh_token)
            .with_roles(response.roles)
            .with_permissions(response.permissions)
    }
}

/// Error body shapes the API uses: `{"detail": ...}` from the framework,
/// `{"error", "message"}` from hand-written handlers.
#[derive(Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// The human-readable message. Structured `detail` values (validation
    /// error lists) are rendered as JSON.
    pub fn into_message(self) -> (Option<String>, Option<String>) {
        let message = match self.detail {
            Some(Value::String(detail)) => Some(detail),
            Some(Value::Null) | None => self.message,
            Some(other) => Some(other.to_string()),
        };
        (self.error, message)
    }
}
