//! Route guards gated on authentication and permissions.

use crate::session::TokenStore;
use crate::traits::Route;

/// What a view needs before it may be shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    pub requires_auth: bool,
    pub permission: Option<String>,
}

impl RouteRequirement {
    /// A view open to everyone.
    pub fn public() -> Self {
        Self::default()
    }

    /// A view that needs a session.
    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            permission: None,
        }
    }

    /// A view that needs a session holding `permission`.
    pub fn permission(permission: impl Into<String>) -> Self {
        Self {
            requires_auth: true,
            permission: Some(permission.into()),
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Send the user to login, returning to `redirect` afterwards.
    RedirectLogin { redirect: String },
    RedirectForbidden,
}

impl GuardDecision {
    /// The route to navigate to, if the decision is a redirect.
    pub fn route(&self) -> Option<Route> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::RedirectLogin { .. } => Some(Route::Login),
            GuardDecision::RedirectForbidden => Some(Route::Forbidden),
        }
    }
}

/// Evaluates [`RouteRequirement`]s against the token store.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    tokens: TokenStore,
}

impl RouteGuard {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }

    /// Decide whether the view at `path` may be entered.
    pub fn check(&self, path: &str, requirement: &RouteRequirement) -> GuardDecision {
        if requirement.requires_auth && !self.tokens.is_authenticated() {
            return GuardDecision::RedirectLogin {
                redirect: path.to_string(),
            };
        }

        match requirement.permission {
            Some(ref permission) if !self.tokens.has_permission(permission) => {
                GuardDecision::RedirectForbidden
            }
            _ => GuardDecision::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::EventBus;
    use crate::session::SessionData;
    use crate::storage::MemoryStorage;

    fn guard(permissions: &[&str]) -> RouteGuard {
        let tokens = TokenStore::new(Arc::new(MemoryStorage::new()), EventBus::new());
        if !permissions.is_empty() {
            tokens
                .set_session(SessionData::new("T1", None).with_permissions(permissions.iter().copied()))
                .unwrap();
        }
        RouteGuard::new(tokens)
    }

    #[test]
    fn anonymous_user_is_sent_to_login() {
        let decision = guard(&[]).check("/users", &RouteRequirement::permission("manage_users"));
        assert_eq!(
            decision,
            GuardDecision::RedirectLogin {
                redirect: "/users".into()
            }
        );
        assert_eq!(decision.route(), Some(Route::Login));
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let decision = guard(&["view_dashboard"]).check("/roles", &RouteRequirement::permission("manage_roles"));
        assert_eq!(decision, GuardDecision::RedirectForbidden);
    }

    #[test]
    fn held_permission_is_allowed() {
        let g = guard(&["manage_users"]);
        assert_eq!(g.check("/users", &RouteRequirement::permission("manage_users")), GuardDecision::Allow);
        assert_eq!(g.check("/profile", &RouteRequirement::authenticated()), GuardDecision::Allow);
    }

    #[test]
    fn public_routes_are_always_allowed() {
        assert_eq!(guard(&[]).check("/auth/login", &RouteRequirement::public()), GuardDecision::Allow);
    }
}
