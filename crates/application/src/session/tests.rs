use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use tally_domain::{
    ApiError, ApiResult, CredentialSet, LoginRequest, MessageResponse, RegisterRequest,
    TokenGrant, UserProfile, status_label,
};

use crate::ports::{AuthApi, Clock, CredentialStore, StoreError};

use super::SessionController;

const NOW: &str = "2026-08-06T12:00:00Z";

fn now() -> DateTime<Utc> {
    NOW.parse().expect("valid timestamp")
}

fn bearer_token(expires_at: DateTime<Utc>) -> String {
    let payload = format!(r#"{{"exp":{}}}"#, expires_at.timestamp());
    format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
}

fn profile() -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        email: "pat@example.com".to_string(),
        name: "Pat".to_string(),
    }
}

fn credential_set(access_expires: DateTime<Utc>) -> CredentialSet {
    CredentialSet {
        access_token: bearer_token(access_expires),
        access_token_expires: access_expires,
        refresh_token: "refresh-1".to_string(),
        refresh_token_expires: access_expires + chrono::Duration::days(30),
        user: profile(),
    }
}

fn grant(access_expires: DateTime<Utc>) -> TokenGrant {
    TokenGrant {
        access_token: bearer_token(access_expires),
        access_token_expires: access_expires,
        refresh_token: "refresh-2".to_string(),
        refresh_token_expires: access_expires + chrono::Duration::days(30),
    }
}

#[derive(Clone, Default)]
struct FakeAuthApi {
    inner: Arc<FakeAuthInner>,
}

#[derive(Default)]
struct FakeAuthInner {
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    fail_refresh: AtomicBool,
    fail_logout: AtomicBool,
    grant: StdMutex<Option<TokenGrant>>,
    bearer: StdMutex<Option<String>>,
}

impl FakeAuthApi {
    fn with_grant(grant: TokenGrant) -> Self {
        let fake = Self::default();
        *fake.inner.grant.lock().unwrap() = Some(grant);
        fake
    }

    fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    fn bearer(&self) -> Option<String> {
        self.inner.bearer.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, _request: &LoginRequest) -> ApiResult<CredentialSet> {
        Err(ApiError::Status {
            status: 401,
            label: status_label(401),
            detail: None,
        })
    }

    async fn register(&self, _request: &RegisterRequest) -> ApiResult<UserProfile> {
        Ok(profile())
    }

    async fn logout(&self) -> ApiResult<MessageResponse> {
        self.inner.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_logout.load(Ordering::SeqCst) {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        Ok(MessageResponse {
            message: "signed out".to_string(),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> ApiResult<TokenGrant> {
        self.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);
        // Keeps the refresh in flight long enough for a second caller to
        // hit the single-flight guard.
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.inner.fail_refresh.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 401,
                label: status_label(401),
                detail: None,
            });
        }
        Ok(self
            .inner
            .grant
            .lock()
            .unwrap()
            .clone()
            .expect("grant not configured"))
    }

    async fn set_bearer_token(&self, token: &str) {
        *self.inner.bearer.lock().unwrap() = Some(token.to_string());
    }

    async fn clear_bearer_token(&self) {
        *self.inner.bearer.lock().unwrap() = None;
    }
}

#[derive(Clone, Default)]
struct MemoryStore {
    saved: Arc<StdMutex<Option<CredentialSet>>>,
}

impl MemoryStore {
    fn stored(&self) -> Option<CredentialSet> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn save(&self, credentials: &CredentialSet) -> Result<(), StoreError> {
        *self.saved.lock().unwrap() = Some(credentials.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<CredentialSet>, StoreError> {
        Ok(self.stored())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.saved.lock().unwrap() = None;
        Ok(())
    }
}

#[derive(Clone)]
struct FakeClock(Arc<StdMutex<DateTime<Utc>>>);

impl FakeClock {
    fn at(instant: DateTime<Utc>) -> Self {
        Self(Arc::new(StdMutex::new(instant)))
    }

    fn set(&self, instant: DateTime<Utc>) {
        *self.0.lock().unwrap() = instant;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

struct Harness {
    controller: Arc<SessionController<FakeAuthApi, MemoryStore, FakeClock>>,
    auth: FakeAuthApi,
    store: MemoryStore,
    clock: FakeClock,
}

fn harness(auth: FakeAuthApi) -> Harness {
    let store = MemoryStore::default();
    let clock = FakeClock::at(now());
    let controller = SessionController::new(auth.clone(), store.clone(), clock.clone());
    Harness {
        controller,
        auth,
        store,
        clock,
    }
}

/// Lets spawned watch tasks run; paused time auto-advances through it.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_fresh_token_is_not_due() {
    let h = harness(FakeAuthApi::default());
    let token = bearer_token(now() + chrono::Duration::minutes(6));
    assert!(!h.controller.check_token_expiry(&token));
}

#[tokio::test]
async fn test_token_at_exact_margin_is_not_due() {
    let h = harness(FakeAuthApi::default());
    let token = bearer_token(now() + chrono::Duration::minutes(5));
    assert!(!h.controller.check_token_expiry(&token));
}

#[tokio::test]
async fn test_token_inside_margin_is_due() {
    let h = harness(FakeAuthApi::default());
    let token = bearer_token(now() + chrono::Duration::minutes(4));
    assert!(h.controller.check_token_expiry(&token));
}

#[tokio::test]
async fn test_undecodable_token_is_due() {
    let h = harness(FakeAuthApi::default());
    assert!(h.controller.check_token_expiry("not-a-token"));
}

#[tokio::test(start_paused = true)]
async fn test_set_auth_data_installs_session() {
    let h = harness(FakeAuthApi::default());
    let set = credential_set(now() + chrono::Duration::hours(1));

    h.controller.set_auth_data(set.clone()).await;

    assert!(h.controller.is_authenticated().await);
    assert_eq!(h.controller.token().await, Some(set.access_token.clone()));
    assert_eq!(h.controller.user().await, Some(set.user.clone()));
    assert_eq!(h.auth.bearer(), Some(set.access_token.clone()));
    assert_eq!(h.store.stored(), Some(set));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_refresh_is_single_flight() {
    let auth = FakeAuthApi::with_grant(grant(now() + chrono::Duration::hours(1)));
    let h = harness(auth);
    h.controller
        .set_auth_data(credential_set(now() + chrono::Duration::hours(1)))
        .await;

    let (first, second) = tokio::join!(
        h.controller.refresh_auth_token(),
        h.controller.refresh_auth_token()
    );

    assert!(first);
    assert!(!second);
    assert_eq!(h.auth.refresh_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_without_session_is_a_no_op() {
    let h = harness(FakeAuthApi::default());
    assert!(!h.controller.refresh_auth_token().await);
    assert_eq!(h.auth.refresh_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_successful_refresh_installs_new_pair() {
    let new_expiry = now() + chrono::Duration::hours(2);
    let auth = FakeAuthApi::with_grant(grant(new_expiry));
    let h = harness(auth);
    let set = credential_set(now() + chrono::Duration::hours(1));
    h.controller.set_auth_data(set.clone()).await;

    assert!(h.controller.refresh_auth_token().await);

    let expected_token = bearer_token(new_expiry);
    assert_eq!(h.controller.token().await, Some(expected_token.clone()));
    assert_eq!(h.auth.bearer(), Some(expected_token.clone()));

    let stored = h.store.stored().expect("credentials persisted");
    assert_eq!(stored.access_token, expected_token);
    assert_eq!(stored.refresh_token, "refresh-2");
    assert_eq!(stored.user, set.user);
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_tears_down_session() {
    let h = harness(FakeAuthApi::default());
    h.controller
        .set_auth_data(credential_set(now() + chrono::Duration::hours(1)))
        .await;
    h.auth.inner.fail_refresh.store(true, Ordering::SeqCst);

    assert!(!h.controller.refresh_auth_token().await);

    assert!(!h.controller.is_authenticated().await);
    assert_eq!(h.controller.token().await, None);
    assert_eq!(h.controller.user().await, None);
    assert_eq!(h.auth.bearer(), None);
    assert_eq!(h.store.stored(), None);
    assert_eq!(h.auth.inner.logout_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_logout_teardown_survives_remote_failure() {
    let h = harness(FakeAuthApi::default());
    h.controller
        .set_auth_data(credential_set(now() + chrono::Duration::hours(1)))
        .await;
    h.auth.inner.fail_logout.store(true, Ordering::SeqCst);

    h.controller.logout().await;

    assert!(!h.controller.is_authenticated().await);
    assert_eq!(h.auth.bearer(), None);
    assert_eq!(h.store.stored(), None);
}

#[tokio::test(start_paused = true)]
async fn test_restore_seeds_session_from_store() {
    let h = harness(FakeAuthApi::default());
    let set = credential_set(now() + chrono::Duration::hours(1));
    h.store.save(&set).await.unwrap();

    assert!(h.controller.restore().await);
    assert!(h.controller.is_authenticated().await);
    assert_eq!(h.auth.bearer(), Some(set.access_token));
}

#[tokio::test(start_paused = true)]
async fn test_restore_with_empty_store_stays_logged_out() {
    let h = harness(FakeAuthApi::default());
    assert!(!h.controller.restore().await);
    assert!(!h.controller.is_authenticated().await);
}

#[tokio::test(start_paused = true)]
async fn test_restoring_stale_token_refreshes_immediately() {
    let auth = FakeAuthApi::with_grant(grant(now() + chrono::Duration::hours(1)));
    let h = harness(auth);
    let stale = credential_set(now() + chrono::Duration::minutes(2));
    h.store.save(&stale).await.unwrap();

    assert!(h.controller.restore().await);

    assert_eq!(h.auth.refresh_calls(), 1);
    assert_eq!(
        h.controller.token().await,
        Some(bearer_token(now() + chrono::Duration::hours(1)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_watch_refreshes_when_token_comes_due() {
    let auth = FakeAuthApi::with_grant(grant(now() + chrono::Duration::hours(2)));
    let h = harness(auth);
    h.controller
        .set_auth_data(credential_set(now() + chrono::Duration::minutes(30)))
        .await;
    settle().await;
    assert_eq!(h.auth.refresh_calls(), 0);

    // One period passes with the token still fresh.
    tokio::time::advance(Duration::from_secs(10 * 60 + 1)).await;
    settle().await;
    assert_eq!(h.auth.refresh_calls(), 0);

    // The wall clock reaches the margin; the next check refreshes.
    h.clock.set(now() + chrono::Duration::minutes(28));
    tokio::time::advance(Duration::from_secs(10 * 60)).await;
    settle().await;
    assert_eq!(h.auth.refresh_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_watch_is_disarmed_on_logout() {
    let auth = FakeAuthApi::with_grant(grant(now() + chrono::Duration::hours(2)));
    let h = harness(auth);
    h.controller
        .set_auth_data(credential_set(now() + chrono::Duration::minutes(30)))
        .await;

    h.controller.logout().await;

    // Even with the token long overdue, no refresh fires after logout.
    h.clock.set(now() + chrono::Duration::hours(3));
    tokio::time::advance(Duration::from_secs(60 * 60)).await;
    settle().await;
    assert_eq!(h.auth.refresh_calls(), 0);
}
