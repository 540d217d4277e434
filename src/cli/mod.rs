//! # CLI Module
//!
//! User-facing commands of harmonyhub. Each command builds on one shared
//! [`SyncOrchestrator`] created by [`connect`], so the credential store and
//! the track cache exist once per process.
//!
//! ## Commands
//!
//! - [`auth`] - Signs in through the browser and fills the track cache
//! - [`signup`] - Opens the Jamendo account sign-up page
//! - [`status`] - Shows sign-in state, token expiry and cache status
//! - [`logout`] - Forgets the stored tokens
//! - [`list_tracks`] - Prints the cached tracks, optionally filtered
//! - [`update_tracks`] - Renews the token if needed and refreshes the cache
//! - [`show_track`] - Prints a single cached track
//!
//! ```text
//! CLI Layer (commands, output)
//!     ↓
//! Sync Orchestrator
//!     ↓
//! Credential Store / Track Cache ←→ Jamendo clients
//! ```
//!
//! ## Usage Patterns
//!
//! ```bash
//! harmonyhub auth                  # Sign in and cache tracks
//! harmonyhub tracks update         # Refresh the cache
//! harmonyhub tracks --search Band  # Filter by name or artist
//! harmonyhub track 42              # Show one track
//! ```

mod auth;
mod tracks;

pub use auth::auth;
pub use auth::logout;
pub use auth::signup;
pub use auth::status;
pub use tracks::list_tracks;
pub use tracks::show_track;
pub use tracks::update_tracks;

use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    Res,
    config::Settings,
    jamendo::{AuthManager, CatalogClient, ClientIdentity},
    management::{CredentialStore, TrackCache},
    sync::SyncOrchestrator,
};

/// How much of the sign-in state a command needs before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Renew an expired access token before the command runs.
    Renew,
    /// Read the stored credentials only.
    Offline,
}

/// Opens the stores under the configured data directory and builds the
/// orchestrator on top of them.
pub async fn connect(settings: &Settings, startup: Startup) -> Res<Arc<SyncOrchestrator>> {
    let credentials = Arc::new(CredentialStore::open(settings.credentials_path()).await?);
    let tracks = Arc::new(
        TrackCache::open(
            settings.tracks_path(),
            CatalogClient::new(settings.api_url.clone()),
        )
        .await?,
    );
    let auth = Arc::new(AuthManager::new(
        ClientIdentity::from(settings),
        Arc::clone(&credentials),
    ));

    let orchestrator = match startup {
        Startup::Renew => SyncOrchestrator::start(auth, credentials, tracks).await,
        Startup::Offline => SyncOrchestrator::open(auth, credentials, tracks),
    };
    Ok(Arc::new(orchestrator))
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
