use std::sync::Arc;

use axum::{Extension, extract::RawQuery, response::Html};
use tokio::sync::{Mutex, Notify};

use crate::{
    sync::{CacheSync, SyncOrchestrator},
    types::AuthOutcome,
    warning,
};

/// Shared between the callback handler and the command waiting for it.
pub struct CallbackState {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub result: Mutex<Option<(AuthOutcome, Option<CacheSync>)>>,
    pub done: Notify,
}

impl CallbackState {
    pub fn new(orchestrator: Arc<SyncOrchestrator>) -> Self {
        Self {
            orchestrator,
            result: Mutex::new(None),
            done: Notify::new(),
        }
    }
}

pub async fn callback(
    RawQuery(query): RawQuery,
    Extension(state): Extension<Arc<CallbackState>>,
) -> Html<&'static str> {
    let redirect_uri = rebuild_redirect_uri(
        state.orchestrator.auth().redirect_uri(),
        query.as_deref().unwrap_or_default(),
    );

    let (outcome, cache) = state.orchestrator.complete_sign_in(&redirect_uri).await;
    let page = match &outcome {
        Ok(_) => Html("<h2>Authentication successful.</h2><p>Close this browser window.</p>"),
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            Html("<h4>Login failed.</h4>")
        }
    };

    *state.result.lock().await = Some((outcome, cache));
    state.done.notify_one();
    page
}

/// Appends `query` to the configured redirect URI, dropping any query the
/// configured URI already carries.
pub fn rebuild_redirect_uri(base: &str, query: &str) -> String {
    let base = base.split('?').next().unwrap_or(base);
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, query)
    }
}
