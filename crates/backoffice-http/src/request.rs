//! Outbound requests and buffered responses.

use std::fmt;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use backoffice_core::Result;
use backoffice_core::error::TransportError;

/// A captured outbound call.
///
/// Kept unprepared (no credentials) so it can be run through the request
/// pipeline again when it is replayed after a refresh.
#[derive(Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Value>,
    auth_exempt: bool,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            auth_exempt: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| TransportError::Request {
            message: format!("could not serialize body: {e}"),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Exclude this request from refresh-and-retry handling.
    ///
    /// Used for the login and refresh calls themselves, where a 401 means
    /// the credentials are wrong rather than that the session expired.
    pub fn auth_exempt(mut self) -> Self {
        self.auth_exempt = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn is_auth_exempt(&self) -> bool {
        self.auth_exempt
    }

    /// The bearer token currently attached, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.keys().map(HeaderName::as_str).collect();
        f.debug_struct("PendingRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &header_names)
            .field("body", &self.body.as_ref().map(|_| "[..]"))
            .field("auth_exempt", &self.auth_exempt)
            .finish()
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
        serde_json::from_slice(bytes).map_err(|e| {
            TransportError::Decode {
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bearer_token_reads_authorization_header() {
        let request = PendingRequest::get("/users")
            .header(AUTHORIZATION, HeaderValue::from_static("Bearer T1"));
        assert_eq!(request.bearer_token(), Some("T1"));
        assert_eq!(PendingRequest::get("/users").bearer_token(), None);
    }

    #[test]
    fn debug_hides_body() {
        let request = PendingRequest::post("/auth/login")
            .json(&json!({"email": "a@b.com", "password": "hunter2"}))
            .unwrap();
        let debug = format!("{:?}", request);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("/auth/login"));
    }

    #[test]
    fn builder_collects_query_and_flags() {
        let request = PendingRequest::get("/tenants")
            .query("page", "2")
            .query("size", "20")
            .auth_exempt();
        assert_eq!(request.query_pairs().len(), 2);
        assert!(request.is_auth_exempt());
        assert_eq!(request.method(), Method::GET);
    }

    #[test]
    fn empty_body_decodes_as_unit() {
        let response = ApiResponse::new(StatusCode::NO_CONTENT, HeaderMap::new(), Vec::new());
        let value: Option<Value> = response.json().unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let response = ApiResponse::new(StatusCode::OK, HeaderMap::new(), b"<html>".to_vec());
        let err = response.json::<Value>().unwrap_err();
        assert!(err.to_string().contains("invalid response body"));
    }
}
