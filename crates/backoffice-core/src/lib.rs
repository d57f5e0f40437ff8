//! backoffice-core - Session state, token store and tenant context for the
//! back-office API client.
//!
//! Nothing in this crate touches the network. It owns the authentication
//! state that the HTTP pipeline in `backoffice-http` reads on every request
//! and mutates on login, refresh and logout.

pub mod context;
pub mod credentials;
pub mod error;
pub mod events;
pub mod guard;
pub mod session;
pub mod storage;
pub mod tokens;
pub mod traits;
pub mod types;

pub use context::{Preferences, TenantContext};
pub use credentials::Credentials;
pub use error::{Error, ErrorKind};
pub use events::{AppEvent, EventBus};
pub use guard::{GuardDecision, RouteGuard, RouteRequirement};
pub use session::{Session, SessionData, TokenStore, User};
pub use storage::{MemoryStorage, StorageKey};
pub use tokens::{AccessToken, Claims, RefreshToken};
pub use traits::{Navigator, NoopNavigator, Route, Storage};
pub use types::{ApiUrl, Language, TenantId};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
