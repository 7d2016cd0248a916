//! HTTP transport layer
//!
//! This module provides:
//! - The schema-validating transport client over reqwest
//! - The REST adapter for the auth endpoints

mod auth_api;
mod client;

pub use auth_api::RestAuthApi;
pub use client::{ApiClient, Payload, RequestDescriptor};
