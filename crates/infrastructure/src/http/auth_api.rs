//! REST adapter for the auth endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use tally_application::ports::AuthApi;
use tally_domain::{
    ApiResult, CredentialSet, LoginRequest, MessageResponse, RegisterRequest, TokenGrant,
    UserProfile,
};

use super::{ApiClient, RequestDescriptor};

const AUTHORIZATION: &str = "Authorization";

/// [`AuthApi`] implementation over the shared transport client.
///
/// Also the transport's bearer-header writer: the session controller calls
/// the two header operations here and nowhere else.
pub struct RestAuthApi {
    client: Arc<ApiClient>,
}

impl RestAuthApi {
    /// Creates the adapter over a shared transport client.
    #[must_use]
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for RestAuthApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<CredentialSet> {
        let descriptor = RequestDescriptor::post("login")
            .with_context("login")
            .with_json(request)?;
        self.client.request(descriptor).await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<UserProfile> {
        let descriptor = RequestDescriptor::post("register")
            .with_context("registration")
            .with_json(request)?;
        self.client.request(descriptor).await
    }

    async fn logout(&self) -> ApiResult<MessageResponse> {
        let descriptor = RequestDescriptor::post("logout").with_context("logout");
        self.client.request(descriptor).await
    }

    async fn refresh(&self, refresh_token: &str) -> ApiResult<TokenGrant> {
        let descriptor = RequestDescriptor::post("auth/refresh")
            .with_context("token refresh")
            .with_json(&json!({ "refreshToken": refresh_token }))?;
        self.client.request(descriptor).await
    }

    async fn set_bearer_token(&self, token: &str) {
        self.client
            .set_default_header(AUTHORIZATION, format!("Bearer {token}"))
            .await;
    }

    async fn clear_bearer_token(&self) {
        self.client.remove_default_header(AUTHORIZATION).await;
    }
}
