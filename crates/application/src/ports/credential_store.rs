//! Credential store port
//!
//! Defines the interface for persisting the credential set between
//! process runs.

use async_trait::async_trait;
use tally_domain::CredentialSet;

/// Errors that can occur during credential store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository trait for credential persistence.
///
/// The store holds the full credential tuple or nothing: a partially
/// present set reads back as `None`. No schema validation happens here —
/// validation already happened upstream in the transport layer.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persists all credential fields as one unit.
    async fn save(&self, credentials: &CredentialSet) -> Result<(), StoreError>;

    /// Loads the stored credential set.
    ///
    /// Returns `Ok(None)` when nothing is stored or any field is missing.
    async fn load(&self) -> Result<Option<CredentialSet>, StoreError>;

    /// Removes every stored credential field.
    ///
    /// Clearing an already-empty store is not an error.
    async fn clear(&self) -> Result<(), StoreError>;
}
