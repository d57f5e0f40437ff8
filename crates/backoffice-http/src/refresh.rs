//! Single-flight session refresh.
//!
//! Any number of requests can fail with 401 at once. The first one starts
//! a refresh; the rest await that same attempt and share its outcome, so
//! the refresh endpoint is hit once and the failure path (clear the
//! session, redirect to login) runs once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, info, instrument, warn};

use backoffice_core::{Navigator, Route, TokenStore};

use crate::auth::AuthApi;

/// Result of one refresh attempt, shared by every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tokens are in the store.
    Refreshed,
    /// The session was destroyed.
    Failed(String),
}

type Flight<T> = (u64, Shared<BoxFuture<'static, T>>);

/// Coalesces concurrent calls into one in-flight future.
pub(crate) struct SingleFlight<T: Clone> {
    current: Mutex<Option<Flight<T>>>,
    next_id: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// Join the in-flight call, or start one with `start`.
    pub async fn run<F>(&self, start: F) -> T
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let (id, flight) = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            match current.as_ref() {
                Some((id, flight)) => {
                    debug!("Joining in-flight call");
                    (*id, flight.clone())
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let flight = start().shared();
                    *current = Some((id, flight.clone()));
                    (id, flight)
                }
            }
        };

        let output = flight.await;

        // A later call may already have started a new flight.
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|(running, _)| *running == id) {
            *current = None;
        }
        output
    }

    #[cfg(test)]
    fn in_flight(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Everything a refresh attempt needs, owned so the attempt can outlive
/// the request that started it.
#[derive(Clone)]
pub(crate) struct RefreshTask {
    pub auth: AuthApi,
    pub tokens: TokenStore,
    pub navigator: Arc<dyn Navigator>,
}

impl RefreshTask {
    /// Exchange the refresh token for a new session. On any failure the
    /// session is cleared and the navigator sent to the login view.
    #[instrument(skip_all)]
    pub async fn run(self) -> RefreshOutcome {
        let result = match self.tokens.refresh_token() {
            Some(refresh_token) => match self.auth.refresh(&refresh_token).await {
                Ok(data) => self.tokens.set_session(data).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            },
            None => Err("no refresh token".to_string()),
        };

        match result {
            Ok(()) => {
                info!("Session refreshed");
                RefreshOutcome::Refreshed
            }
            Err(reason) => {
                warn!(%reason, "Session refresh failed; signing out");
                if let Err(e) = self.tokens.clear() {
                    warn!(error = %e, "Session cleared in memory only");
                }
                self.navigator.navigate(Route::Login);
                RefreshOutcome::Failed(reason)
            }
        }
    }
}
