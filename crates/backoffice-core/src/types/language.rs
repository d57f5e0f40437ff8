//! UI language preference.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A BCP 47-style language tag such as `pt-BR` or `en`.
///
/// Only the shape is checked: alphanumeric subtags of 1 to 8 characters
/// separated by hyphens, the first being alphabetic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    /// The language used when none has been chosen.
    pub const DEFAULT: &'static str = "pt-BR";

    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        let mut subtags = s.split('-');
        let primary_ok = subtags
            .next()
            .is_some_and(|p| (1..=8).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_alphabetic()));
        let rest_ok = subtags.all(|t| (1..=8).contains(&t.len()) && t.bytes().all(|b| b.is_ascii_alphanumeric()));

        if primary_ok && rest_ok {
            Ok(Self(s))
        } else {
            Err(InvalidInputError::Language {
                value: s,
                reason: "expected a tag like 'pt-BR' or 'en'".to_string(),
            }
            .into())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Language::new(s).map_err(serde::de::Error::custom)
    }
}
