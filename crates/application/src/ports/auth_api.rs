//! Auth endpoint port
//!
//! The session controller talks to the remote auth endpoints through this
//! trait, and it is also the single writer of the transport's bearer
//! default header via the two header operations.

use async_trait::async_trait;
use tally_domain::{
    ApiResult, CredentialSet, LoginRequest, MessageResponse, RegisterRequest, TokenGrant,
    UserProfile,
};

/// Port for the authentication endpoints of the remote API.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST login` — exchanges credentials for a full credential set.
    async fn login(&self, request: &LoginRequest) -> ApiResult<CredentialSet>;

    /// `POST register` — creates an account; the caller signs in afterwards.
    async fn register(&self, request: &RegisterRequest) -> ApiResult<UserProfile>;

    /// `POST logout` — invalidates the session server-side.
    async fn logout(&self) -> ApiResult<MessageResponse>;

    /// `POST auth/refresh` — exchanges a refresh token for a new pair.
    async fn refresh(&self, refresh_token: &str) -> ApiResult<TokenGrant>;

    /// Installs `Authorization: Bearer <token>` as a transport default
    /// header. Idempotent.
    async fn set_bearer_token(&self, token: &str);

    /// Removes the bearer default header entirely. Idempotent.
    async fn clear_bearer_token(&self);
}
