//! Validated value types.
//!
//! These types enforce their invariants at construction time, so a value
//! that made it this far is safe to put in a URL or a header.

mod api_url;
mod language;
mod tenant_id;

pub use api_url::ApiUrl;
pub use language::Language;
pub use tenant_id::TenantId;
