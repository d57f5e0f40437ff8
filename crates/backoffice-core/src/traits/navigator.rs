//! Navigation side effects.

use std::fmt;

/// A view the response pipeline can redirect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The login view, after the session could not be recovered.
    Login,
    /// The forbidden view, after a 403.
    Forbidden,
}

impl Route {
    /// Path of the route in the front end.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Forbidden => "/forbidden",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Receives redirects requested by the response pipeline.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// A navigator that ignores every redirect.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _route: Route) {}
}
