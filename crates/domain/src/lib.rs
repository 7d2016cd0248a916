//! Tally Domain - Core business types
//!
//! This crate defines the domain model for the Tally finance client core.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod notification;

pub use auth::{
    CredentialSet, LoginRequest, MessageResponse, RegisterRequest, TokenGrant, UserProfile,
    decode_expiry,
};
pub use error::{ApiError, ApiResult, FieldIssue, status_label};
pub use notification::Notification;
