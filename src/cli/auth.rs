use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use chrono::Utc;
use tokio::net::TcpListener;

use crate::{
    api::CallbackState,
    config::Settings,
    error, info,
    server::{serve_callback, wait_for_sign_in},
    success,
    sync::{CacheSync, SyncOrchestrator},
    utils, warning,
};

const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(120);

/// Signs in through the browser.
///
/// Starts the local callback server, opens the authorize page and waits for
/// the provider's redirect. The redirect handler exchanges the code, stores
/// the tokens and fills the track cache.
pub async fn auth(settings: &Settings, orchestrator: Arc<SyncOrchestrator>) {
    let addr = match SocketAddr::from_str(&settings.server_address) {
        Ok(addr) => addr,
        Err(e) => error!("Failed to parse server address: {}", e),
    };
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => error!("Cannot listen on {}: {}", addr, e),
    };

    let state = Arc::new(CallbackState::new(Arc::clone(&orchestrator)));
    let server_state = Arc::clone(&state);
    let redirect_uri = settings.redirect_uri.clone();
    tokio::spawn(async move {
        if let Err(e) = serve_callback(listener, &redirect_uri, server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if let Err(e) = orchestrator.auth().begin_authorization() {
        error!("Cannot start authorization: {}", e);
    }
    info!("Waiting for Jamendo to redirect back...");

    match wait_for_sign_in(state, SIGN_IN_TIMEOUT).await {
        Some((Ok(_), cache)) => {
            success!("Authentication successful!");
            match cache {
                Some(CacheSync::Refreshed(count)) => success!("Cached {} tracks.", count),
                Some(CacheSync::Stale(e)) => warning!("Signed in, but fetching tracks failed: {}", e),
                None => {}
            }
        }
        Some((Err(e), _)) => error!("Authentication failed: {}", e),
        None => error!("Authentication failed or timed out."),
    }
}

pub async fn signup(orchestrator: Arc<SyncOrchestrator>) {
    orchestrator.auth().begin_sign_up();
    info!("Create an account in the browser, then run harmonyhub auth.");
}

pub async fn logout(orchestrator: Arc<SyncOrchestrator>) {
    match orchestrator.sign_out().await {
        Ok(()) => success!("Signed out."),
        Err(e) => error!("Failed to remove stored tokens. Err: {}", e),
    }
}

pub async fn status(orchestrator: Arc<SyncOrchestrator>) {
    let state = orchestrator.auth_state().borrow().clone();
    if state.is_authenticated {
        success!("Signed in to Jamendo.");
    } else {
        warning!("Not signed in. Run harmonyhub auth.");
    }
    if let Some(e) = state.error {
        warning!("Last token refresh failed: {}", e);
    }

    if let Some(expiry) = orchestrator.credentials().expiry() {
        info!("Access token expires {}", utils::describe_expiry(expiry, Utc::now()));
    }

    info!("{} tracks in the local cache.", orchestrator.tracks().len());
}
