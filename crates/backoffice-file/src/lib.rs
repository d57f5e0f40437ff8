//! backoffice-file - File-backed durable storage.

mod store;

pub use store::FileStorage;
