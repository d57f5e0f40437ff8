//! Tenant selection and UI preferences kept in durable storage.

use std::sync::Arc;

use tracing::{info, warn};

use crate::Result;
use crate::events::{AppEvent, EventBus};
use crate::storage::StorageKey;
use crate::traits::Storage;
use crate::types::{Language, TenantId};

/// The tenant that scopes outgoing requests.
///
/// Read straight from storage on every call, so it always reflects what
/// the token store or another process last wrote.
#[derive(Debug, Clone)]
pub struct TenantContext {
    storage: Arc<dyn Storage>,
    events: EventBus,
}

impl TenantContext {
    pub fn new(storage: Arc<dyn Storage>, events: EventBus) -> Self {
        Self { storage, events }
    }

    /// The selected tenant. An unreadable or invalid entry counts as none.
    pub fn current(&self) -> Option<TenantId> {
        match self.storage.get(StorageKey::CurrentTenant) {
            Ok(Some(raw)) => match TenantId::new(raw) {
                Ok(tenant) => Some(tenant),
                Err(e) => {
                    warn!(error = %e, "Ignoring invalid stored tenant");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Could not read stored tenant");
                None
            }
        }
    }

    pub fn select(&self, tenant: TenantId) -> Result<()> {
        self.storage.set(StorageKey::CurrentTenant, tenant.as_str())?;
        info!(%tenant, "Tenant selected");
        self.events.emit(AppEvent::TenantChanged(Some(tenant)));
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove(StorageKey::CurrentTenant)?;
        info!("Tenant cleared");
        self.events.emit(AppEvent::TenantChanged(None));
        Ok(())
    }
}

/// User preferences that outlive the session.
#[derive(Debug, Clone)]
pub struct Preferences {
    storage: Arc<dyn Storage>,
    events: EventBus,
}

impl Preferences {
    pub fn new(storage: Arc<dyn Storage>, events: EventBus) -> Self {
        Self { storage, events }
    }

    /// The chosen language, or [`Language::DEFAULT`].
    pub fn language(&self) -> Language {
        self.storage
            .get(StorageKey::Language)
            .ok()
            .flatten()
            .and_then(|raw| Language::new(raw).ok())
            .unwrap_or_default()
    }

    pub fn set_language(&self, language: Language) -> Result<()> {
        self.storage.set(StorageKey::Language, language.as_str())?;
        self.events.emit(AppEvent::LanguageChanged(language));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn tenant_round_trips_through_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let tenants = TenantContext::new(storage.clone(), EventBus::new());
        assert!(tenants.current().is_none());

        tenants.select(TenantId::new("42").unwrap()).unwrap();
        assert_eq!(tenants.current().unwrap().as_str(), "42");
        assert_eq!(storage.get(StorageKey::CurrentTenant).unwrap().as_deref(), Some("42"));

        tenants.clear().unwrap();
        assert!(tenants.current().is_none());
    }

    #[test]
    fn stored_tenant_with_spaces_is_kept() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(StorageKey::CurrentTenant, "Acme Corp").unwrap();
        let tenants = TenantContext::new(storage, EventBus::new());
        assert_eq!(tenants.current().unwrap().as_str(), "Acme Corp");
    }

    #[test]
    fn invalid_stored_tenant_is_ignored() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(StorageKey::CurrentTenant, "bad\r\nvalue").unwrap();
        let tenants = TenantContext::new(storage, EventBus::new());
        assert!(tenants.current().is_none());
    }

    #[tokio::test]
    async fn selecting_a_tenant_emits_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let tenants = TenantContext::new(Arc::new(MemoryStorage::new()), bus);

        tenants.select(TenantId::new("acme").unwrap()).unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            AppEvent::TenantChanged(Some(TenantId::new("acme").unwrap()))
        );
    }

    #[test]
    fn language_defaults_and_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let prefs = Preferences::new(storage.clone(), EventBus::new());
        assert_eq!(prefs.language().as_str(), "pt-BR");

        prefs.set_language(Language::new("en-US").unwrap()).unwrap();
        assert_eq!(prefs.language().as_str(), "en-US");
        assert_eq!(storage.get(StorageKey::Language).unwrap().as_deref(), Some("en-US"));
    }
}
