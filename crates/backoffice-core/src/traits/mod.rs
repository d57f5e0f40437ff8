//! Seams for storage and navigation.

mod navigator;
mod storage;

pub use navigator::{Navigator, NoopNavigator, Route};
pub use storage::Storage;
