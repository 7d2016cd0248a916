//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external
//! systems. Each port is a trait that can be implemented by adapters in the
//! infrastructure layer.

mod auth_api;
mod clock;
mod credential_store;
mod notifier;

pub use auth_api::AuthApi;
pub use clock::Clock;
pub use credential_store::{CredentialStore, StoreError};
pub use notifier::Notifier;
