//! Request preparation and response classification.
//!
//! Outbound requests pass through an ordered list of [`RequestStage`]s
//! before they reach the transport. Responses are sorted into a
//! [`ResponseAction`] that tells the client whether to pass them through,
//! attempt a refresh, or redirect to the forbidden view.

mod bearer;
mod tenant;

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;

use backoffice_core::{TenantContext, TokenStore};

use crate::request::PendingRequest;

pub use bearer::BearerAuth;
pub use tenant::{TENANT_HEADER, TenantHeader};

/// One step applied to every outbound request.
///
/// Stages read shared state at the moment they run, so a replayed request
/// picks up whatever changed since the first attempt.
pub trait RequestStage: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, request: &mut PendingRequest);
}

/// Ordered request stages.
#[derive(Clone, Default)]
pub struct RequestPipeline {
    stages: Vec<Arc<dyn RequestStage>>,
}

impl RequestPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bearer credentials, then the tenant header.
    pub fn standard(tokens: TokenStore, tenants: TenantContext) -> Self {
        Self::new()
            .with_stage(BearerAuth::new(tokens))
            .with_stage(TenantHeader::new(tenants))
    }

    pub fn with_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn push(&mut self, stage: Arc<dyn RequestStage>) {
        self.stages.push(stage);
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over a copy of `request`.
    pub fn prepare(&self, request: &PendingRequest) -> PendingRequest {
        let mut prepared = request.clone();
        for stage in &self.stages {
            stage.apply(&mut prepared);
        }
        prepared
    }
}

impl fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stage_names()).finish()
    }
}

/// What the client does with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    /// Hand the response back unchanged.
    Pass,
    /// Refresh the session and replay the request once.
    Refresh,
    /// Redirect to the forbidden view and fail.
    Forbidden,
}

/// Decide what to do with a first-attempt response.
///
/// Auth-exempt requests never trigger a refresh; their 401 belongs to the
/// caller.
pub fn classify(request: &PendingRequest, status: StatusCode) -> ResponseAction {
    match status {
        StatusCode::UNAUTHORIZED if !request.is_auth_exempt() => ResponseAction::Refresh,
        StatusCode::FORBIDDEN => ResponseAction::Forbidden,
        _ => ResponseAction::Pass,
    }
}
