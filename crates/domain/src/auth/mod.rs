//! Authentication types
//!
//! This module provides:
//! - The credential set persisted between sessions
//! - Request/response shapes for the auth endpoints
//! - Bearer-token claim decoding for refresh scheduling

mod claims;
mod types;

pub use claims::decode_expiry;
pub use types::{
    CredentialSet, LoginRequest, MessageResponse, RegisterRequest, TokenGrant, UserProfile,
};
