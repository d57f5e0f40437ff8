//! Tenant identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Identifier of the tenant that scopes a request, sent as `X-Tenant-ID`.
///
/// Opaque to the client; validated only so that it is a legal header value.
/// Spaces and non-ASCII text are fine, control characters are not.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Create a tenant id, validating that it can be sent as a header value.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        let reason = if s.trim().is_empty() {
            Some("must not be blank")
        } else if s.bytes().any(|b| (b < 0x20 && b != b'\t') || b == 0x7f) {
            Some("must not contain control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidInputError::TenantId {
                value: s,
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(Self(s)),
        }
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TenantId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for TenantId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TenantId::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numeric_and_slug_ids() {
        assert_eq!(TenantId::new("42").unwrap().as_str(), "42");
        assert!(TenantId::new("acme-corp").is_ok());
    }

    #[test]
    fn accepts_display_names() {
        assert_eq!(TenantId::new("Acme Corp").unwrap().as_str(), "Acme Corp");
        assert!(TenantId::new("Açme Ltda").is_ok());
        assert!(TenantId::new("x".repeat(300)).is_ok());
    }

    #[test]
    fn rejects_blank_and_control_characters() {
        assert!(TenantId::new("").is_err());
        assert!(TenantId::new("   ").is_err());
        assert!(TenantId::new("acme\n").is_err());
        assert!(TenantId::new("acme\u{7f}").is_err());
    }
}
