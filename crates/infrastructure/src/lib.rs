//! Tally Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports defined in
//! the application layer: the reqwest-backed transport client, the REST
//! auth adapter, the file-backed credential store, and the small system
//! adapters (clock, notification sink).

pub mod adapters;
pub mod http;
pub mod persistence;

pub use adapters::{SystemClock, TracingNotifier};
pub use http::{ApiClient, Payload, RequestDescriptor, RestAuthApi};
pub use persistence::FileCredentialStore;
