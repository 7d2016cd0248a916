//! Persistence adapters

mod credential_store;

pub use credential_store::FileCredentialStore;
