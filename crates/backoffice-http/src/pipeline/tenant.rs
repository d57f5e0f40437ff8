use reqwest::header::HeaderValue;

use backoffice_core::TenantContext;

use super::RequestStage;
use crate::request::PendingRequest;

/// Header that scopes a request to a tenant.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Attaches [`TENANT_HEADER`] when a tenant is selected.
#[derive(Debug, Clone)]
pub struct TenantHeader {
    tenants: TenantContext,
}

impl TenantHeader {
    pub fn new(tenants: TenantContext) -> Self {
        Self { tenants }
    }
}

impl RequestStage for TenantHeader {
    fn name(&self) -> &'static str {
        "tenant-header"
    }

    fn apply(&self, request: &mut PendingRequest) {
        let headers = request.headers_mut();
        headers.remove(TENANT_HEADER);

        if let Some(tenant) = self.tenants.current()
            && let Ok(value) = HeaderValue::from_str(tenant.as_str())
        {
            headers.insert(TENANT_HEADER, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use backoffice_core::{EventBus, MemoryStorage, Storage, StorageKey, TenantId};

    fn context() -> TenantContext {
        TenantContext::new(Arc::new(MemoryStorage::new()), EventBus::new())
    }

    #[test]
    fn attaches_selected_tenant() {
        let tenants = context();
        tenants.select(TenantId::new("42").unwrap()).unwrap();
        let mut request = PendingRequest::get("/users");

        TenantHeader::new(tenants).apply(&mut request);

        assert_eq!(request.headers()[TENANT_HEADER], "42");
    }

    #[test]
    fn stored_tenant_with_spaces_is_attached() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(StorageKey::CurrentTenant, "Acme Corp").unwrap();
        let tenants = TenantContext::new(storage, EventBus::new());
        let mut request = PendingRequest::get("/users");

        TenantHeader::new(tenants).apply(&mut request);

        assert_eq!(request.headers()[TENANT_HEADER], "Acme Corp");
    }

    #[test]
    fn no_tenant_means_no_header() {
        let mut request = PendingRequest::get("/users");
        TenantHeader::new(context()).apply(&mut request);
        assert!(!request.headers().contains_key(TENANT_HEADER));
    }
}
