//! The authenticated API client.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use backoffice_core::error::{AuthError, Error};
use backoffice_core::{
    Credentials, EventBus, MemoryStorage, Navigator, NoopNavigator, Preferences, Result, Route,
    RouteGuard, Session, Storage, TenantContext, TokenStore,
};

use crate::auth::{AuthApi, Dispatcher};
use crate::config::ClientConfig;
use crate::pipeline::{RequestPipeline, RequestStage, ResponseAction, classify};
use crate::refresh::{RefreshOutcome, RefreshTask, SingleFlight};
use crate::request::{ApiResponse, PendingRequest};
use crate::transport::{HttpTransport, protocol_error};

/// HTTP client that attaches session credentials and tenant scope to every
/// request, and recovers from an expired access token by refreshing once
/// and replaying.
///
/// Cheap to clone; clones share the session and the in-flight refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    dispatcher: Dispatcher,
    auth: AuthApi,
    tokens: TokenStore,
    tenants: TenantContext,
    preferences: Preferences,
    events: EventBus,
    navigator: Arc<dyn Navigator>,
    refresh: SingleFlight<RefreshOutcome>,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    storage: Option<Arc<dyn Storage>>,
    navigator: Option<Arc<dyn Navigator>>,
    events: Option<EventBus>,
    stages: Vec<Arc<dyn RequestStage>>,
}

impl ApiClientBuilder {
    /// Durable storage for the session. Defaults to [`MemoryStorage`].
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Receiver for login and forbidden redirects. Defaults to
    /// [`NoopNavigator`].
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a request stage after the standard bearer and tenant stages.
    pub fn stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Build the client, restoring any session found in storage.
    pub fn build(self) -> Result<ApiClient> {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()) as Arc<dyn Storage>);
        let events = self.events.unwrap_or_default();
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(NoopNavigator) as Arc<dyn Navigator>);

        let tokens = TokenStore::restore(storage.clone(), events.clone())?;
        let tenants = TenantContext::new(storage.clone(), events.clone());
        let preferences = Preferences::new(storage, events.clone());

        let mut pipeline = RequestPipeline::standard(tokens.clone(), tenants.clone());
        for stage in self.stages {
            pipeline.push(stage);
        }

        let dispatcher = Dispatcher {
            transport: HttpTransport::new(&self.config)?,
            pipeline,
        };
        debug!(api = %self.config.api_url, stages = ?dispatcher.pipeline, "API client ready");

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                auth: AuthApi::new(dispatcher.clone()),
                dispatcher,
                tokens,
                tenants,
                preferences,
                events,
                navigator,
                refresh: SingleFlight::new(),
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            storage: None,
            navigator: None,
            events: None,
            stages: Vec::new(),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn tenants(&self) -> &TenantContext {
        &self.inner.tenants
    }

    pub fn preferences(&self) -> &Preferences {
        &self.inner.preferences
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn session(&self) -> Session {
        self.inner.tokens.snapshot()
    }

    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.inner.tokens.clone())
    }

    /// Authenticate and store the new session.
    ///
    /// A 401 from the login endpoint is [`AuthError::InvalidCredentials`];
    /// it never triggers a refresh. Other rejections, such as a disabled
    /// account, keep the server's message. Accounts with two-factor
    /// authentication get [`AuthError::SecondFactorRequired`] and finish
    /// with [`ApiClient::verify_second_factor`].
    #[instrument(skip_all, fields(email = credentials.email()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let data = self.inner.auth.login(credentials).await?;
        self.inner.tokens.set_session(data)?;
        info!("Logged in");
        Ok(self.session())
    }

    /// Submit the two-factor `code` for `email` and store the session it
    /// grants.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn verify_second_factor(&self, email: &str, code: &str) -> Result<Session> {
        let data = self.inner.auth.verify_second_factor(email, code).await?;
        self.inner.tokens.set_session(data)?;
        info!("Logged in with second factor");
        Ok(self.session())
    }

    /// Tell the server the session is over, then clear it locally.
    ///
    /// The local session is cleared even if the server call fails.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<()> {
        if self.inner.tokens.is_authenticated()
            && let Err(e) = self.inner.auth.logout().await
        {
            warn!(error = %e, "Server-side logout failed; clearing local session anyway");
        }
        self.inner.tokens.clear()
    }

    /// Refresh the session now.
    ///
    /// Joins an automatic refresh if one is already running. On failure the
    /// session has been cleared.
    pub async fn refresh(&self) -> Result<()> {
        match self.refresh_once().await {
            RefreshOutcome::Refreshed => Ok(()),
            RefreshOutcome::Failed(reason) => Err(AuthError::RefreshFailed { reason }.into()),
        }
    }

    async fn refresh_once(&self) -> RefreshOutcome {
        let task = RefreshTask {
            auth: self.inner.auth.clone(),
            tokens: self.inner.tokens.clone(),
            navigator: self.inner.navigator.clone(),
        };
        self.inner.refresh.run(move || task.run().boxed()).await
    }

    /// Send `request` through the pipeline.
    ///
    /// - 2xx responses are returned.
    /// - A 401 on a non-exempt request refreshes the session (shared with
    ///   any concurrent 401s) and replays the request once. If the refresh
    ///   fails, the original 401 is returned and the session is gone.
    /// - A 403 redirects to the forbidden view and is returned as an error.
    /// - Anything else becomes a [`backoffice_core::error::ProtocolError`].
    #[instrument(skip_all, fields(method = %request.method(), path = request.path()))]
    pub async fn execute(&self, request: PendingRequest) -> Result<ApiResponse> {
        let inner = &self.inner;
        let prepared = inner.dispatcher.pipeline.prepare(&request);
        let response = inner.dispatcher.transport.send(&prepared).await?;

        match classify(&request, response.status()) {
            ResponseAction::Pass => into_result(response),
            ResponseAction::Forbidden => Err(self.forbidden(&response)),
            ResponseAction::Refresh => {
                let original = protocol_error(&response);
                if !self.recover_session(prepared.bearer_token()).await {
                    return Err(original.into());
                }

                debug!("Replaying request with refreshed credentials");
                let response = inner.dispatcher.send(&request).await?;
                if response.status() == StatusCode::FORBIDDEN {
                    return Err(self.forbidden(&response));
                }
                into_result(response)
            }
        }
    }

    /// Whether the request should be replayed after a 401.
    async fn recover_session(&self, sent_with: Option<&str>) -> bool {
        let current = self.inner.tokens.access_token();
        match (sent_with, current.as_ref().map(|t| t.as_str())) {
            // Another request already rotated the token.
            (sent, Some(current)) if sent != Some(current) => {
                debug!("Access token changed since the request was sent");
                true
            }
            // Another request already failed to refresh and signed out.
            (Some(_), None) => {
                debug!("Session was cleared while the request was in flight");
                false
            }
            _ => matches!(self.refresh_once().await, RefreshOutcome::Refreshed),
        }
    }

    fn forbidden(&self, response: &ApiResponse) -> Error {
        warn!("Access forbidden");
        self.inner.navigator.navigate(Route::Forbidden);
        protocol_error(response).into()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(PendingRequest::get(path)).await?.json()
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(PendingRequest::post(path).json(body)?)
            .await?
            .json()
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(PendingRequest::put(path).json(body)?)
            .await?
            .json()
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(PendingRequest::delete(path)).await.map(|_| ())
    }
}

fn into_result(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(protocol_error(&response).into())
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("api", &self.inner.dispatcher.transport.api().as_str())
            .field("tokens", &self.inner.tokens)
            .field("pipeline", &self.inner.dispatcher.pipeline)
            .finish()
    }
}
