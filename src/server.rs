use axum::{Extension, Router, routing::get};
use reqwest::Url;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;

use crate::{
    Res, api,
    api::CallbackState,
    sync::CacheSync,
    types::AuthOutcome,
};

/// Router serving the redirect callback at the path of `redirect_uri`.
pub fn callback_router(redirect_uri: &str, state: Arc<CallbackState>) -> Res<Router> {
    let path = Url::parse(redirect_uri)?.path().to_string();
    Ok(Router::new()
        .route(&path, get(api::callback))
        .layer(Extension(state)))
}

/// Serves the callback on `listener` until one redirect has been handled.
pub async fn serve_callback(listener: TcpListener, redirect_uri: &str, state: Arc<CallbackState>) -> Res<()> {
    let app = callback_router(redirect_uri, Arc::clone(&state))?;
    let shutdown = async move { state.done.notified().await };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Waits for the callback handler to store its result.
///
/// Polls the shared state once per second and gives up after `max_wait`.
pub async fn wait_for_sign_in(
    state: Arc<CallbackState>,
    max_wait: Duration,
) -> Option<(AuthOutcome, Option<CacheSync>)> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < max_wait {
        let mut lock = state.result.lock().await;
        if let Some(result) = lock.take() {
            return Some(result);
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}
