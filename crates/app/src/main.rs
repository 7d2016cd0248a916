//! Tally - Session Core Entry Point
//!
//! Wires the transport client, credential store, and session controller
//! together, restores any persisted session, and keeps the process
//! resident so the expiry watch can run. The UI shell attaches on top of
//! this core and is not part of this binary.

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use tally_application::SessionController;
use tally_infrastructure::{
    ApiClient, FileCredentialStore, RestAuthApi, SystemClock, TracingNotifier,
};

/// Base URL of the remote API unless `TALLY_API_URL` overrides it.
const DEFAULT_API_URL: &str = "https://api.tally.example/api/";

fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TALLY_STATE_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_url =
        std::env::var("TALLY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let base_url = Url::parse(&api_url)?;
    tracing::info!(%base_url, "starting Tally session core v{}", env!("CARGO_PKG_VERSION"));

    let client = Arc::new(ApiClient::new(base_url, Arc::new(TracingNotifier::new())));
    let store = FileCredentialStore::in_dir(&state_dir());
    let controller =
        SessionController::new(RestAuthApi::new(Arc::clone(&client)), store, SystemClock::new());

    if controller.restore().await {
        match controller.user().await {
            Some(user) => tracing::info!(email = %user.email, "session restored"),
            None => tracing::info!("session restored"),
        }
        tokio::signal::ctrl_c().await?;
        tracing::info!("shutting down");
    } else {
        tracing::info!("no stored session; sign in from the app to create one");
    }

    Ok(())
}
