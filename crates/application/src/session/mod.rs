//! Session controller
//!
//! Owns the in-memory session state (token, refresh token, user) and the
//! credential lifecycle around it: login, restore, refresh, logout. The
//! controller is the single writer of the persisted credential set and of
//! the transport's bearer header.

mod watch;

use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use tally_domain::{
    ApiResult, CredentialSet, LoginRequest, RegisterRequest, TokenGrant, UserProfile,
    decode_expiry,
};

use crate::ports::{AuthApi, Clock, CredentialStore};

/// Tokens expiring within this margin are treated as already due.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// In-memory session fields. `token` and `user` are never set
/// independently; `is_refreshing` is a single-flight flag, not a queue.
#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserProfile>,
    is_refreshing: bool,
}

/// Coordinates credential state between the auth endpoints, the credential
/// store, and the transport's bearer header.
///
/// The session moves between three states: logged out, logged in, and a
/// transient refreshing state that is exclusive by construction (the
/// `is_refreshing` flag rejects overlapping refresh attempts instead of
/// queueing them).
pub struct SessionController<A, S, C> {
    auth: A,
    store: S,
    clock: C,
    state: Mutex<SessionState>,
    watch: Mutex<Option<JoinHandle<()>>>,
    this: Weak<Self>,
}

impl<A, S, C> SessionController<A, S, C>
where
    A: AuthApi + 'static,
    S: CredentialStore + 'static,
    C: Clock + 'static,
{
    /// Creates a controller wired to the given adapters.
    ///
    /// Returned behind `Arc` because the expiry watch task holds a handle
    /// back to the controller.
    pub fn new(auth: A, store: S, clock: C) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            auth,
            store,
            clock,
            state: Mutex::new(SessionState::default()),
            watch: Mutex::new(None),
            this: this.clone(),
        })
    }

    /// True once both a token and a user are present.
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.lock().await;
        state.token.is_some() && state.user.is_some()
    }

    /// Current bearer token, if any.
    pub async fn token(&self) -> Option<String> {
        self.state.lock().await.token.clone()
    }

    /// Currently signed-in user, if any.
    pub async fn user(&self) -> Option<UserProfile> {
        self.state.lock().await.user.clone()
    }

    /// Whether the given token needs refreshing.
    ///
    /// True when the token carries no decodable expiry, or when the expiry
    /// is less than five minutes away.
    pub fn check_token_expiry(&self, token: &str) -> bool {
        decode_expiry(token).is_none_or(|expires_at| {
            expires_at - self.clock.now() < chrono::Duration::minutes(REFRESH_MARGIN_MINUTES)
        })
    }

    /// Signs in and installs the returned credential set.
    pub async fn login(&self, request: LoginRequest) -> ApiResult<UserProfile> {
        let credentials = self.auth.login(&request).await?;
        let user = credentials.user.clone();
        self.set_auth_data(credentials).await;
        Ok(user)
    }

    /// Creates an account. The caller signs in separately afterwards.
    pub async fn register(&self, request: RegisterRequest) -> ApiResult<UserProfile> {
        self.auth.register(&request).await
    }

    /// Seeds the session from the credential store.
    ///
    /// Called once at process start. A missing or partial stored set leaves
    /// the session logged out; a complete one is installed exactly as a
    /// fresh login, including the expiry watch (a stale stored token
    /// triggers an immediate refresh).
    pub async fn restore(&self) -> bool {
        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!(%error, "could not read stored credentials");
                None
            }
        };
        let Some(credentials) = stored else {
            return false;
        };

        self.auth.set_bearer_token(&credentials.access_token).await;
        {
            let mut state = self.state.lock().await;
            state.token = Some(credentials.access_token.clone());
            state.refresh_token = Some(credentials.refresh_token.clone());
            state.user = Some(credentials.user.clone());
            state.is_refreshing = false;
        }
        self.arm_expiry_watch().await;
        true
    }

    /// Installs a credential set: persists it, sets the bearer header,
    /// updates in-memory state, and re-arms the expiry watch.
    ///
    /// Has no error path of its own; the values must come from a successful
    /// login or refresh response. A store failure is logged, not
    /// propagated — the in-memory session is authoritative.
    pub async fn set_auth_data(&self, credentials: CredentialSet) {
        if let Err(error) = self.store.save(&credentials).await {
            tracing::warn!(%error, "could not persist credentials");
        }
        self.auth.set_bearer_token(&credentials.access_token).await;
        {
            let mut state = self.state.lock().await;
            state.token = Some(credentials.access_token.clone());
            state.refresh_token = Some(credentials.refresh_token.clone());
            state.user = Some(credentials.user);
            state.is_refreshing = false;
        }
        self.arm_expiry_watch().await;
    }

    /// Ends the session.
    ///
    /// The remote logout call is best-effort: its failure is logged and
    /// never blocks the local teardown. State, stored credentials, and the
    /// bearer header are cleared unconditionally.
    pub async fn logout(&self) {
        if let Err(error) = self.auth.logout().await {
            tracing::warn!(%error, "remote logout failed");
        }
        if let Err(error) = self.store.clear().await {
            tracing::warn!(%error, "could not clear stored credentials");
        }
        self.auth.clear_bearer_token().await;
        {
            let mut state = self.state.lock().await;
            *state = SessionState::default();
        }
        // Disarm last: when logout cascades from a failed refresh inside
        // the watch task, aborting that task must not cut teardown short.
        self.disarm_watch().await;
    }

    /// Exchanges the current refresh token for a new pair.
    ///
    /// Single-flight: while one refresh is in flight, further calls return
    /// `false` immediately without touching the network — callers must not
    /// assume a refresh occurred. Returns `true` only when new credentials
    /// were installed. Any refresh failure is fatal to the session and
    /// cascades into [`Self::logout`].
    pub async fn refresh_auth_token(&self) -> bool {
        let refresh_token = {
            let mut state = self.state.lock().await;
            if state.is_refreshing {
                return false;
            }
            let Some(token) = state.refresh_token.clone() else {
                return false;
            };
            state.is_refreshing = true;
            token
        };

        match self.auth.refresh(&refresh_token).await {
            Ok(grant) => {
                self.auth.set_bearer_token(&grant.access_token).await;
                {
                    let mut state = self.state.lock().await;
                    state.token = Some(grant.access_token.clone());
                    state.refresh_token = Some(grant.refresh_token.clone());
                    state.is_refreshing = false;
                }
                self.persist_grant(grant).await;
                // New token, fresh timer.
                self.spawn_watch_task().await;
                true
            }
            Err(error) => {
                tracing::warn!(%error, "token refresh failed, ending session");
                self.state.lock().await.is_refreshing = false;
                self.logout().await;
                false
            }
        }
    }

    /// Writes the refreshed pair back to the store, keeping the stored user.
    async fn persist_grant(&self, grant: TokenGrant) {
        let Some(user) = self.user().await else {
            return;
        };
        let credentials = CredentialSet {
            access_token: grant.access_token,
            access_token_expires: grant.access_token_expires,
            refresh_token: grant.refresh_token,
            refresh_token_expires: grant.refresh_token_expires,
            user,
        };
        if let Err(error) = self.store.save(&credentials).await {
            tracing::warn!(%error, "could not persist refreshed credentials");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
