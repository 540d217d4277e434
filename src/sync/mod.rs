//! # Synchronization
//!
//! Ties the credential lifecycle to the track cache. [`SyncOrchestrator`]
//! decides, from the stored credentials, whether the user is signed in,
//! refreshes expired access tokens, refills the track cache with a valid
//! token, and publishes:
//!
//! - the authentication state as a watch channel (latest value wins)
//! - navigation intents through [`NavigationEvents`] (one-shot, in order)
//!
//! ## Decision tree
//!
//! ```text
//! no access/refresh token ──────────────→ signed out, NavigateToLogin
//! token expired ── refresh ok ──────────→ signed in, NavigateToHome, refill cache
//!               └─ refresh failed ──────→ signed out, NavigateToLogin
//! token valid ──────────────────────────→ signed in, refill cache
//! ```

mod navigation;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};

use crate::{
    error::{AuthError, CacheError, StoreError},
    jamendo::AuthManager,
    management::{CredentialStore, TrackCache},
    types::{AuthOutcome, AuthState, NavigationEvent},
};

pub use navigation::NavigationEvents;

/// What happened to the track cache during a sync.
#[derive(Debug)]
pub enum CacheSync {
    Refreshed(usize),
    /// The refresh failed; the cache still holds the previous snapshot.
    Stale(CacheError),
}

#[derive(Debug)]
pub enum SyncOutcome {
    /// No usable credentials are stored.
    SignInRequired,
    /// The access token had expired and could not be renewed.
    RefreshFailed(AuthError),
    Synced {
        token_refreshed: bool,
        cache: CacheSync,
    },
}

/// Coordinates authorization state with track cache refreshes.
pub struct SyncOrchestrator {
    auth: Arc<AuthManager>,
    credentials: Arc<CredentialStore>,
    tracks: Arc<TrackCache>,
    state: watch::Sender<AuthState>,
    navigation: NavigationEvents,
}

impl SyncOrchestrator {
    /// Builds the orchestrator and resolves the initial authentication state
    /// from the stored credentials, renewing an expired token if possible.
    pub async fn start(
        auth: Arc<AuthManager>,
        credentials: Arc<CredentialStore>,
        tracks: Arc<TrackCache>,
    ) -> Self {
        let orchestrator = Self::assemble(auth, credentials, tracks);
        orchestrator.check_auth_state().await;
        orchestrator
    }

    /// Builds the orchestrator from the stored credentials alone. An expired
    /// token counts as signed out and is not renewed; no network call is made.
    pub fn open(
        auth: Arc<AuthManager>,
        credentials: Arc<CredentialStore>,
        tracks: Arc<TrackCache>,
    ) -> Self {
        let orchestrator = Self::assemble(auth, credentials, tracks);
        let record = orchestrator.credentials.snapshot();
        orchestrator.state.send_replace(AuthState {
            is_authenticated: record.access_token.is_some() && !record.is_expired_at(Utc::now()),
            error: None,
        });
        orchestrator
    }

    fn assemble(
        auth: Arc<AuthManager>,
        credentials: Arc<CredentialStore>,
        tracks: Arc<TrackCache>,
    ) -> Self {
        Self {
            auth,
            credentials,
            tracks,
            state: watch::Sender::new(AuthState::default()),
            navigation: NavigationEvents::new(),
        }
    }

    pub fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub async fn navigation_events(&self) -> mpsc::UnboundedReceiver<NavigationEvent> {
        self.navigation.subscribe().await
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn tracks(&self) -> &TrackCache {
        &self.tracks
    }

    /// Re-evaluates the stored credentials without touching the cache or
    /// raising navigation events.
    pub async fn check_auth_state(&self) -> AuthState {
        let record = self.credentials.snapshot();

        let state = match &record.access_token {
            None => AuthState::default(),
            Some(_) if !record.is_expired_at(Utc::now()) => AuthState {
                is_authenticated: true,
                error: None,
            },
            Some(_) => {
                log::info!("stored access token expired, refreshing");
                match self.auth.refresh_access_token().await {
                    Ok(_) => AuthState {
                        is_authenticated: true,
                        error: None,
                    },
                    Err(e) => AuthState {
                        is_authenticated: false,
                        error: Some(e.to_string()),
                    },
                }
            }
        };

        self.state.send_replace(state.clone());
        state
    }

    /// Makes sure a valid access token is available and, if so, refills the
    /// track cache with it exactly once.
    pub async fn check_and_refresh_token(&self) -> SyncOutcome {
        let record = self.credentials.snapshot();

        let access_token = match (&record.access_token, &record.refresh_token) {
            (Some(access), Some(_)) => access.clone(),
            _ => {
                self.publish(false, None);
                self.navigation.emit(NavigationEvent::NavigateToLogin).await;
                return SyncOutcome::SignInRequired;
            }
        };

        if record.is_expired_at(Utc::now()) {
            log::info!("access token expired, refreshing before sync");
            return match self.auth.refresh_access_token().await {
                Ok(grant) => {
                    self.publish(true, None);
                    self.navigation.emit(NavigationEvent::NavigateToHome).await;
                    SyncOutcome::Synced {
                        token_refreshed: true,
                        cache: self.refill(&grant.access_token).await,
                    }
                }
                Err(e) => {
                    self.publish(false, Some(e.to_string()));
                    self.navigation.emit(NavigationEvent::NavigateToLogin).await;
                    SyncOutcome::RefreshFailed(e)
                }
            };
        }

        if self.publish(true, None) {
            self.navigation.emit(NavigationEvent::NavigateToHome).await;
        }

        SyncOutcome::Synced {
            token_refreshed: false,
            cache: self.refill(&access_token).await,
        }
    }

    /// Finishes sign-in from the provider's redirect and, on success, fills
    /// the cache with the new token.
    pub async fn complete_sign_in(&self, redirect_uri: &str) -> (AuthOutcome, Option<CacheSync>) {
        match self.auth.complete_authorization(redirect_uri).await {
            Ok(grant) => {
                self.publish(true, None);
                self.navigation.emit(NavigationEvent::NavigateToHome).await;
                let cache = self.refill(&grant.access_token).await;
                (Ok(grant), Some(cache))
            }
            Err(e) => {
                self.publish(false, Some(e.to_string()));
                self.navigation.emit(NavigationEvent::NavigateToLogin).await;
                (Err(e), None)
            }
        }
    }

    /// Forgets all credentials. The track cache is left as is.
    pub async fn sign_out(&self) -> Result<(), StoreError> {
        self.credentials.clear_tokens().await?;
        self.publish(false, None);
        self.navigation.emit(NavigationEvent::NavigateToLogin).await;
        Ok(())
    }

    async fn refill(&self, access_token: &str) -> CacheSync {
        match self.tracks.refresh(access_token, self.auth.client_id()).await {
            Ok(count) => CacheSync::Refreshed(count),
            Err(e) => CacheSync::Stale(e),
        }
    }

    /// Publishes a new state; returns true when the authenticated flag flipped.
    /// Compare and write happen under the channel's write lock.
    fn publish(&self, is_authenticated: bool, error: Option<String>) -> bool {
        let mut flipped = false;
        self.state.send_modify(|state| {
            flipped = state.is_authenticated != is_authenticated;
            *state = AuthState {
                is_authenticated,
                error,
            };
        });
        flipped
    }
}
