//! Error types for the back-office client.
//!
//! One unified error type with explicit variants for transport,
//! authentication, protocol, storage and input validation failures.
//! [`Error::kind`] folds these into the four categories the request
//! pipeline reasons about.

use std::fmt;
use thiserror::Error;

/// The unified error type for back-office client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (bad credentials, refresh failure).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success HTTP responses from the API.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Durable storage errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (bad URL, tenant id, language tag).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No access token, or the server rejected it with 401.
    Unauthenticated,
    /// The session is valid but lacks permission (403).
    Unauthorized,
    /// The refresh token was rejected; the session has been destroyed.
    RefreshFailed,
    /// Network failures and every other non-success response.
    NetworkOrServer,
    /// Local storage could not be read or written.
    Storage,
    /// The caller supplied malformed input.
    InvalidInput,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::NetworkOrServer,
            Error::Auth(AuthError::RefreshFailed { .. }) => ErrorKind::RefreshFailed,
            Error::Auth(_) => ErrorKind::Unauthenticated,
            Error::Protocol(e) if e.is_unauthenticated() => ErrorKind::Unauthenticated,
            Error::Protocol(e) if e.is_forbidden() => ErrorKind::Unauthorized,
            Error::Protocol(_) => ErrorKind::NetworkOrServer,
            Error::Storage(_) => ErrorKind::Storage,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// HTTP status of the underlying response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// A request could not be built (bad header value, unserializable body).
    #[error("invalid request: {message}")]
    Request { message: String },

    /// Response body could not be decoded.
    #[error("invalid response body: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server rejected the supplied credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account requires a second factor before tokens are issued.
    #[error("two-factor verification required")]
    SecondFactorRequired,

    /// The server rejected the two-factor verification code.
    #[error("invalid verification code")]
    InvalidSecondFactor,

    /// Exchanging the refresh token failed; the session was cleared.
    #[error("session refresh failed: {reason}")]
    RefreshFailed { reason: String },
}

/// A non-success HTTP response.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable error code, if the server sent one.
    pub error: Option<String>,
    /// Human-readable message (`detail` or `message` from the body).
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// True for 401 responses.
    pub fn is_unauthenticated(&self) -> bool {
        self.status == 401
    }

    /// True for 403 responses.
    pub fn is_forbidden(&self) -> bool {
        self.status == 403
    }
}

/// Durable storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The backing file exists but is not valid JSON.
    #[error("corrupt storage file {path}: {message}")]
    Corrupt { path: String, message: String },

    /// A value could not be serialized for storage.
    #[error("could not serialize {key}: {message}")]
    Serialize { key: String, message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid tenant identifier.
    #[error("invalid tenant id '{value}': {reason}")]
    TenantId { value: String, reason: String },

    /// Invalid language tag.
    #[error("invalid language '{value}': {reason}")]
    Language { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display_includes_detail() {
        let err = ProtocolError::new(422, None, Some("email is required".into()));
        assert_eq!(err.to_string(), "HTTP 422: email is required");
    }

    #[test]
    fn kinds_follow_status() {
        let unauth: Error = ProtocolError::new(401, None, None).into();
        let forbidden: Error = ProtocolError::new(403, None, None).into();
        let server: Error = ProtocolError::new(500, None, None).into();
        let conflict: Error = ProtocolError::new(409, None, None).into();

        assert_eq!(unauth.kind(), ErrorKind::Unauthenticated);
        assert_eq!(forbidden.kind(), ErrorKind::Unauthorized);
        assert_eq!(server.kind(), ErrorKind::NetworkOrServer);
        assert_eq!(conflict.kind(), ErrorKind::NetworkOrServer);
        assert_eq!(conflict.status(), Some(409));
    }

    #[test]
    fn refresh_failure_is_its_own_kind() {
        let err: Error = AuthError::RefreshFailed {
            reason: "HTTP 401".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::RefreshFailed);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn transport_errors_are_network_kind() {
        let err: Error = TransportError::Timeout.into();
        assert_eq!(err.kind(), ErrorKind::NetworkOrServer);
    }
}
