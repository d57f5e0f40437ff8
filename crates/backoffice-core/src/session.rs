//! Session state and the token store.
//!
//! The [`TokenStore`] is the only owner of authentication state. Every
//! request reads the current access token from it, and only login, refresh
//! and logout write to it. All writes go to durable [`Storage`] as well, so
//! a restarted client can [`TokenStore::restore`] where it left off.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::error::StorageError;
use crate::events::{AppEvent, EventBus};
use crate::storage::StorageKey;
use crate::tokens::{AccessToken, Claims, RefreshToken};
use crate::traits::Storage;

/// Identity record decoded from the access token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Derive the user from token claims: the `user` claim when it is an
    /// object, otherwise the subject as the email.
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        if let Some(Value::Object(user)) = &claims.user
            && let Ok(user) = serde_json::from_value(Value::Object(user.clone()))
        {
            return Some(user);
        }

        claims.sub.as_ref().map(|sub| User {
            email: Some(sub.clone()),
            ..User::default()
        })
    }

    /// Best label for display: name, then email, then id.
    pub fn display_name(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .or_else(|| self.id.as_ref().map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }))
    }
}

/// Token payload returned by login and refresh.
#[derive(Clone, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl SessionData {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn with_roles<I: IntoIterator<Item = S>, S: Into<String>>(mut self, roles: I) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_permissions<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        permissions: I,
    ) -> Self {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("tokens", &"[REDACTED]")
            .field("roles", &self.roles)
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// A snapshot of the authentication state.
///
/// An absent access token means the session is unauthenticated.
#[derive(Debug, Clone, Default)]
pub struct Session {
    access_token: Option<AccessToken>,
    refresh_token: Option<RefreshToken>,
    user: Option<User>,
    roles: BTreeSet<String>,
    permissions: BTreeSet<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Expiry read from the access token's `exp` claim, if any.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }
}

/// Owner of the current [`Session`], backed by durable storage.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    session: RwLock<Session>,
    storage: Arc<dyn Storage>,
    events: EventBus,
}

impl TokenStore {
    /// Create a store with an empty session. Storage is not read.
    pub fn new(storage: Arc<dyn Storage>, events: EventBus) -> Self {
        Self::with_session(storage, events, Session::default())
    }

    /// Rebuild the session from durable storage.
    ///
    /// Malformed `user`, `roles` or `permissions` entries are logged and
    /// treated as empty rather than failing startup.
    #[instrument(skip_all)]
    pub fn restore(storage: Arc<dyn Storage>, events: EventBus) -> Result<Self> {
        let access_token = storage.get(StorageKey::AccessToken)?.map(AccessToken::new);
        let refresh_token = storage.get(StorageKey::RefreshToken)?.map(RefreshToken::new);
        let user = read_json::<User>(storage.as_ref(), StorageKey::User)?;
        let roles = read_json::<BTreeSet<String>>(storage.as_ref(), StorageKey::Roles)?
            .unwrap_or_default();
        let permissions = read_json::<BTreeSet<String>>(storage.as_ref(), StorageKey::Permissions)?
            .unwrap_or_default();
        let expires_at = access_token
            .as_ref()
            .and_then(AccessToken::claims)
            .and_then(|c| c.expires_at());

        let session = Session {
            access_token,
            refresh_token,
            user,
            roles,
            permissions,
            expires_at,
        };

        debug!(authenticated = session.is_authenticated(), "Restored session");
        Ok(Self::with_session(storage, events, session))
    }

    fn with_session(storage: Arc<dyn Storage>, events: EventBus, session: Session) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                session: RwLock::new(session),
                storage,
                events,
            }),
        }
    }

    /// Replace the session with the tokens and identity in `data`.
    ///
    /// Identity is decoded from the access token. When `data` carries no
    /// refresh token the current one is kept. Storage is written before
    /// the in-memory session changes, so a storage failure leaves the
    /// previous session in place.
    #[instrument(skip_all, fields(roles = data.roles.len(), permissions = data.permissions.len()))]
    pub fn set_session(&self, data: SessionData) -> Result<()> {
        let access_token = AccessToken::new(data.access_token);
        let claims = access_token.claims();
        if claims.is_none() {
            debug!("Access token carries no readable claims");
        }
        let user = claims.as_ref().and_then(User::from_claims);
        let expires_at = claims.as_ref().and_then(Claims::expires_at);

        let refresh_token = match data.refresh_token {
            Some(token) => Some(RefreshToken::new(token)),
            None => self.refresh_token(),
        };

        let session = Session {
            access_token: Some(access_token),
            refresh_token,
            user,
            roles: data.roles.into_iter().collect(),
            permissions: data.permissions.into_iter().collect(),
            expires_at,
        };

        self.persist(&session)?;
        *self.inner.session.write().unwrap_or_else(PoisonError::into_inner) = session;

        info!("Session established");
        self.inner.events.emit(AppEvent::UserUpdated);
        Ok(())
    }

    fn persist(&self, session: &Session) -> Result<()> {
        let storage = self.inner.storage.as_ref();

        let mut entries = vec![
            (StorageKey::Roles, to_json(StorageKey::Roles, &session.roles)?),
            (
                StorageKey::Permissions,
                to_json(StorageKey::Permissions, &session.permissions)?,
            ),
        ];
        let mut removals = Vec::new();

        match &session.access_token {
            Some(token) => entries.push((StorageKey::AccessToken, token.as_str().to_string())),
            None => removals.push(StorageKey::AccessToken),
        }
        match &session.refresh_token {
            Some(token) => entries.push((StorageKey::RefreshToken, token.as_str().to_string())),
            None => removals.push(StorageKey::RefreshToken),
        }
        match &session.user {
            Some(user) => entries.push((StorageKey::User, to_json(StorageKey::User, user)?)),
            None => removals.push(StorageKey::User),
        }

        storage.write_batch(&entries, &removals)
    }

    /// Destroy the session in memory and in storage, then emit
    /// [`AppEvent::SessionExpired`].
    ///
    /// The in-memory session is always cleared and the event always
    /// emitted; a storage failure is still reported to the caller.
    #[instrument(skip_all)]
    pub fn clear(&self) -> Result<()> {
        *self.inner.session.write().unwrap_or_else(PoisonError::into_inner) = Session::default();

        let storage = self.inner.storage.as_ref();
        let had_tenant = matches!(storage.get(StorageKey::CurrentTenant), Ok(Some(_)));
        let result = storage.remove_many(&StorageKey::SESSION);
        if let Err(ref e) = result {
            warn!(error = %e, "Failed to clear persisted session");
        }

        info!("Session cleared");
        if had_tenant {
            self.inner.events.emit(AppEvent::TenantChanged(None));
        }
        self.inner.events.emit(AppEvent::SessionExpired);
        result
    }

    /// A copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.read(Session::clone)
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.read(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.read(|s| s.refresh_token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.read(|s| s.user.clone())
    }

    pub fn roles(&self) -> BTreeSet<String> {
        self.read(|s| s.roles.clone())
    }

    pub fn permissions(&self) -> BTreeSet<String> {
        self.read(|s| s.permissions.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(Session::is_authenticated)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.read(Session::expires_at)
    }

    /// Membership check against the last-known permission snapshot.
    pub fn has_permission(&self, name: &str) -> bool {
        self.read(|s| s.has_permission(name))
    }

    /// Membership check against the last-known role snapshot.
    pub fn has_role(&self, name: &str) -> bool {
        self.read(|s| s.has_role(name))
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    fn read<T>(&self, f: impl FnOnce(&Session) -> T) -> T {
        let session = self.inner.session.read().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.is_authenticated())
            .field("storage", &self.inner.storage)
            .finish()
    }
}

fn to_json<T: Serialize>(key: StorageKey, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| {
        StorageError::Serialize {
            key: key.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

fn read_json<T: serde::de::DeserializeOwned>(
    storage: &dyn Storage,
    key: StorageKey,
) -> Result<Option<T>> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(%key, error = %e, "Ignoring malformed persisted value");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::tokens::testing::jwt;
    use serde_json::json;

    fn store() -> (TokenStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (TokenStore::new(storage.clone(), EventBus::new()), storage)
    }

    #[test]
    fn login_payload_grants_roles_and_permissions() {
        let (store, _) = store();
        store
            .set_session(
                SessionData::new("T1", Some("R1".into()))
                    .with_roles(["admin"])
                    .with_permissions(["manage_users"]),
            )
            .unwrap();

        assert!(store.is_authenticated());
        assert!(store.has_permission("manage_users"));
        assert!(store.has_role("admin"));
        assert!(!store.has_permission("manage_tenants"));
        assert!(store.user().is_none());
    }

    #[test]
    fn set_session_persists_every_field() {
        let (store, storage) = store();
        let token = jwt(&json!({"sub": "a@b.com", "user": {"id": 1, "name": "Ana"}}));
        store
            .set_session(
                SessionData::new(token.clone(), Some("R1".into()))
                    .with_roles(["admin"])
                    .with_permissions(["manage_users", "view_dashboard"]),
            )
            .unwrap();

        assert_eq!(storage.get(StorageKey::AccessToken).unwrap(), Some(token));
        assert_eq!(storage.get(StorageKey::RefreshToken).unwrap().as_deref(), Some("R1"));
        assert_eq!(storage.get(StorageKey::Roles).unwrap().as_deref(), Some(r#"["admin"]"#));
        assert_eq!(
            storage.get(StorageKey::Permissions).unwrap().as_deref(),
            Some(r#"["manage_users","view_dashboard"]"#)
        );
        let user: User = serde_json::from_str(&storage.get(StorageKey::User).unwrap().unwrap()).unwrap();
        assert_eq!(user.name.as_deref(), Some("Ana"));
    }

    /// Storage that counts write calls, delegating to [`MemoryStorage`].
    #[derive(Debug, Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        writes: std::sync::atomic::AtomicUsize,
    }

    impl CountingStorage {
        fn bump(&self) {
            self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl Storage for CountingStorage {
        fn get(&self, key: StorageKey) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: StorageKey, value: &str) -> Result<()> {
            self.bump();
            self.inner.set(key, value)
        }

        fn remove(&self, key: StorageKey) -> Result<()> {
            self.bump();
            self.inner.remove(key)
        }

        fn write_batch(
            &self,
            entries: &[(StorageKey, String)],
            removals: &[StorageKey],
        ) -> Result<()> {
            self.bump();
            self.inner.write_batch(entries, removals)
        }
    }

    #[test]
    fn set_session_is_a_single_storage_write() {
        let storage = Arc::new(CountingStorage::default());
        storage.inner.set(StorageKey::User, r#"{"email":"old@b.com"}"#).unwrap();
        let store = TokenStore::new(storage.clone(), EventBus::new());

        store.set_session(SessionData::new("opaque", None)).unwrap();

        assert_eq!(storage.writes.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(storage.get(StorageKey::AccessToken).unwrap().as_deref(), Some("opaque"));
        assert!(storage.get(StorageKey::User).unwrap().is_none());
    }

    #[test]
    fn user_falls_back_to_subject() {
        let (store, _) = store();
        store
            .set_session(SessionData::new(jwt(&json!({"sub": "a@b.com", "exp": 2_000_000_000})), None))
            .unwrap();

        let user = store.user().unwrap();
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
        assert_eq!(user.display_name().as_deref(), Some("a@b.com"));
        assert_eq!(store.expires_at().unwrap().timestamp(), 2_000_000_000);
    }

    #[test]
    fn refresh_without_new_refresh_token_keeps_the_old_one() {
        let (store, _) = store();
        store.set_session(SessionData::new("T1", Some("R1".into()))).unwrap();
        store.set_session(SessionData::new("T2", None)).unwrap();

        assert_eq!(store.access_token().unwrap().as_str(), "T2");
        assert_eq!(store.refresh_token().unwrap().as_str(), "R1");
    }

    #[test]
    fn clear_wipes_session_keys_but_keeps_language() {
        let (store, storage) = store();
        storage.set(StorageKey::Language, "en").unwrap();
        storage.set(StorageKey::CurrentTenant, "7").unwrap();
        store
            .set_session(SessionData::new("T1", Some("R1".into())).with_roles(["admin"]))
            .unwrap();

        store.clear().unwrap();

        assert!(!store.is_authenticated());
        assert!(store.roles().is_empty());
        for key in StorageKey::SESSION {
            assert!(storage.get(key).unwrap().is_none(), "{key} survived");
        }
        assert_eq!(storage.get(StorageKey::Language).unwrap().as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn clear_emits_session_expired() {
        let (store, storage) = store();
        storage.set(StorageKey::CurrentTenant, "7").unwrap();
        let mut rx = store.events().subscribe();

        store.clear().unwrap();

        assert_eq!(rx.recv().await.unwrap(), AppEvent::TenantChanged(None));
        assert_eq!(rx.recv().await.unwrap(), AppEvent::SessionExpired);
    }

    #[test]
    fn restore_reads_persisted_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(StorageKey::AccessToken, "T1").unwrap();
        storage.set(StorageKey::RefreshToken, "R1").unwrap();
        storage.set(StorageKey::Roles, r#"["admin"]"#).unwrap();
        storage.set(StorageKey::Permissions, "not json").unwrap();

        let store = TokenStore::restore(storage, EventBus::new()).unwrap();

        assert!(store.is_authenticated());
        assert!(store.has_role("admin"));
        assert!(store.permissions().is_empty());
        assert_eq!(store.refresh_token().unwrap().as_str(), "R1");
    }

    #[test]
    fn restore_from_empty_storage_is_unauthenticated() {
        let store = TokenStore::restore(Arc::new(MemoryStorage::new()), EventBus::new()).unwrap();
        assert!(!store.is_authenticated());
        assert!(store.snapshot().user().is_none());
    }

    #[test]
    fn non_object_user_claim_uses_subject() {
        let claims = Claims {
            sub: Some("x@y.com".into()),
            user: Some(json!("x")),
            ..Claims::default()
        };
        assert_eq!(User::from_claims(&claims).unwrap().email.as_deref(), Some("x@y.com"));
    }
}
