//! Expiry watch
//!
//! An explicit timer owned by the session controller, independent of any
//! UI lifecycle: armed whenever a token becomes present, disarmed on every
//! token change, so exactly one watch exists per token.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::ports::{AuthApi, Clock, CredentialStore};

use super::SessionController;

/// How often an armed watch re-checks the current token.
const CHECK_INTERVAL: Duration = Duration::from_secs(10 * 60);

impl<A, S, C> SessionController<A, S, C>
where
    A: AuthApi + 'static,
    S: CredentialStore + 'static,
    C: Clock + 'static,
{
    /// Arms the expiry watch for the current token.
    ///
    /// Checks the token immediately: if it is already due, a refresh is
    /// triggered instead of a timer (a successful refresh arms the watch
    /// for the new token). Otherwise a periodic check is scheduled that
    /// always re-reads the current in-memory token, never the one captured
    /// here.
    pub(super) async fn arm_expiry_watch(&self) {
        let Some(token) = self.token().await else {
            return;
        };
        if self.check_token_expiry(&token) {
            self.refresh_auth_token().await;
            return;
        }
        self.spawn_watch_task().await;
    }

    /// Replaces the watch task with a fresh one.
    ///
    /// Returns a boxed, type-erased `Send` future rather than being a plain
    /// `async fn`: the spawned task calls back into `refresh_auth_token`,
    /// which in turn calls this method, and erasing the return type here is
    /// what breaks the otherwise self-referential `Send` obligation that
    /// `tokio::spawn` imposes on that cycle.
    pub(super) fn spawn_watch_task(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let Some(controller) = self.this.upgrade() else {
                return;
            };
            let handle = tokio::spawn(async move {
                let mut interval = tokio::time::interval(CHECK_INTERVAL);
                // The first tick of a tokio interval fires immediately.
                interval.tick().await;
                loop {
                    interval.tick().await;
                    let Some(token) = controller.token().await else {
                        break;
                    };
                    if controller.check_token_expiry(&token) {
                        controller.refresh_auth_token().await;
                        // A successful refresh armed a fresh watch; a failed
                        // one tore the session down. Either way this task is
                        // done.
                        break;
                    }
                }
            });
            // Store the new handle before aborting the old task: the old task
            // may be the one running this code, and an abort only lands at its
            // next await point.
            let previous = self.watch.lock().await.replace(handle);
            if let Some(previous) = previous {
                previous.abort();
            }
        })
    }

    /// Stops the watch task, if one is armed.
    pub(super) async fn disarm_watch(&self) {
        if let Some(handle) = self.watch.lock().await.take() {
            handle.abort();
        }
    }
}
