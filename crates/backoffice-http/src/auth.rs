//! Calls to the auth endpoints.

use reqwest::StatusCode;
use tracing::{debug, instrument};

use backoffice_core::error::AuthError;
use backoffice_core::{Credentials, RefreshToken, Result, SessionData};

use crate::endpoints::{self, LoginRequest, RefreshRequest, SecondFactorRequest, TokenResponse};
use crate::pipeline::RequestPipeline;
use crate::request::{ApiResponse, PendingRequest};
use crate::transport::{HttpTransport, protocol_error};

/// Transport plus request pipeline, without any response handling.
#[derive(Debug, Clone)]
pub(crate) struct Dispatcher {
    pub transport: HttpTransport,
    pub pipeline: RequestPipeline,
}

impl Dispatcher {
    pub async fn send(&self, request: &PendingRequest) -> Result<ApiResponse> {
        let prepared = self.pipeline.prepare(request);
        self.transport.send(&prepared).await
    }
}

/// Login, second-factor verification, refresh and logout.
///
/// All of them are auth-exempt: a 401 from them is an answer, not a reason
/// to refresh.
#[derive(Debug, Clone)]
pub(crate) struct AuthApi {
    dispatcher: Dispatcher,
}

impl AuthApi {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    #[instrument(skip_all, fields(email = credentials.email()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionData> {
        let request = PendingRequest::post(endpoints::LOGIN)
            .json(&LoginRequest {
                email: credentials.email(),
                password: credentials.password(),
            })?
            .auth_exempt();

        let response = self.dispatcher.send(&request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        let tokens: TokenResponse = success_json(&response)?;
        if tokens.requires_2fa {
            return Err(AuthError::SecondFactorRequired.into());
        }
        if tokens.access_token.is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(tokens.into())
    }

    /// Complete a login that answered with `requires_2fa`.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn verify_second_factor(&self, email: &str, code: &str) -> Result<SessionData> {
        let request = PendingRequest::post(endpoints::VERIFY_2FA)
            .json(&SecondFactorRequest { email, code })?
            .auth_exempt();

        let response = self.dispatcher.send(&request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Verification code rejected");
            return Err(AuthError::InvalidSecondFactor.into());
        }
        let tokens: TokenResponse = success_json(&response)?;
        if tokens.access_token.is_empty() {
            return Err(AuthError::InvalidSecondFactor.into());
        }
        Ok(tokens.into())
    }

    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &RefreshToken) -> Result<SessionData> {
        let request = PendingRequest::post(endpoints::REFRESH)
            .json(&RefreshRequest {
                refresh_token: refresh_token.as_str(),
            })?
            .auth_exempt();

        let response = self.dispatcher.send(&request).await?;
        let tokens: TokenResponse = success_json(&response)?;
        if tokens.access_token.is_empty() {
            return Err(AuthError::RefreshFailed {
                reason: "response carried no access token".to_string(),
            }
            .into());
        }
        debug!(rotated = tokens.refresh_token.is_some(), "Refresh accepted");
        Ok(tokens.into())
    }

    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<()> {
        let request = PendingRequest::post(endpoints::LOGOUT).auth_exempt();
        let response = self.dispatcher.send(&request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(protocol_error(&response).into())
        }
    }
}

fn success_json<T: serde::de::DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    if response.is_success() {
        response.json()
    } else {
        Err(protocol_error(response).into())
    }
}
