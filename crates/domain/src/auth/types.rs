//! Credential and auth endpoint types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The account profile returned by the server on login and registration.
///
/// Opaque to the session core beyond (de)serialization; presentation code
/// decides what to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Server-issued account identifier.
    pub id: Uuid,
    /// Account email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// The full persisted credential tuple.
///
/// All five fields are written and cleared together; a set with any field
/// missing is treated as no session at all. The wire and storage key names
/// are the server's camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSet {
    /// Bearer token sent on every authenticated request.
    pub access_token: String,
    /// When the access token stops being accepted.
    pub access_token_expires: DateTime<Utc>,
    /// Token exchanged for a fresh pair at `auth/refresh`.
    pub refresh_token: String,
    /// When the refresh token itself expires.
    pub refresh_token_expires: DateTime<Utc>,
    /// The signed-in account.
    pub user: UserProfile,
}

impl CredentialSet {
    /// Replaces the token pair, keeping the user untouched.
    #[must_use]
    pub fn with_grant(mut self, grant: TokenGrant) -> Self {
        self.access_token = grant.access_token;
        self.access_token_expires = grant.access_token_expires;
        self.refresh_token = grant.refresh_token;
        self.refresh_token_expires = grant.refresh_token_expires;
        self
    }
}

/// A fresh token pair returned by `auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    /// New bearer token.
    pub access_token: String,
    /// Expiry of the new bearer token.
    pub access_token_expires: DateTime<Utc>,
    /// New refresh token.
    pub refresh_token: String,
    /// Expiry of the new refresh token.
    pub refresh_token_expires: DateTime<Utc>,
}

/// Body of `POST login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password, sent as-is over TLS.
    pub password: String,
}

/// Body of `POST register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Account email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Chosen password.
    pub password: String,
}

/// Plain acknowledgement body, e.g. from `POST logout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable acknowledgement.
    pub message: String,
}
