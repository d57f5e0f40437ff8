//! Command implementations.

pub mod auth;
pub mod lang;
pub mod request;
pub mod tenant;
