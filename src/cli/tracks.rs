use std::sync::Arc;

use tabled::Table;

use crate::{
    error, info, success,
    sync::{CacheSync, SyncOrchestrator, SyncOutcome},
    types::{Track, TrackTableRow},
    warning,
};

use super::spinner;

/// Prints the cached tracks, filtered by `search` when given. Reads the local
/// cache only.
pub async fn list_tracks(orchestrator: Arc<SyncOrchestrator>, search: Option<String>) {
    let cache = orchestrator.tracks();
    let mut tracks: Vec<Track> = match &search {
        Some(query) => cache.search(query).current(),
        None => cache.list_all().current(),
    };

    if tracks.is_empty() {
        match search {
            Some(query) => warning!("No cached track matches '{}'.", query),
            None => warning!("Track cache is empty. Run harmonyhub tracks update."),
        }
        return;
    }

    tracks.sort_by(|a, b| {
        a.artist_name
            .to_lowercase()
            .cmp(&b.artist_name.to_lowercase())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    let rows: Vec<TrackTableRow> = tracks.iter().map(TrackTableRow::from).collect();
    println!("{}", Table::new(rows));
}

/// Renews the access token when needed and refreshes the track cache.
pub async fn update_tracks(orchestrator: Arc<SyncOrchestrator>) {
    let pb = spinner("Syncing tracks with Jamendo...");
    let outcome = orchestrator.check_and_refresh_token().await;
    pb.finish_and_clear();

    match outcome {
        SyncOutcome::SignInRequired => {
            warning!("Not signed in. Run harmonyhub auth.")
        }
        SyncOutcome::RefreshFailed(e) => {
            error!("Access token expired and could not be renewed: {}\nRun harmonyhub auth.", e)
        }
        SyncOutcome::Synced {
            token_refreshed,
            cache,
        } => {
            if token_refreshed {
                info!("Access token renewed.");
            }
            match cache {
                CacheSync::Refreshed(count) => success!("Cached {} tracks.", count),
                CacheSync::Stale(e) => warning!(
                    "Track refresh failed, keeping {} cached tracks: {}",
                    orchestrator.tracks().len(),
                    e
                ),
            }
        }
    }
}

pub async fn show_track(orchestrator: Arc<SyncOrchestrator>, id: &str) {
    match orchestrator.tracks().get_by_id(id).current() {
        Some(track) => {
            println!("{}", Table::new([TrackTableRow::from(&track)]));
            if !track.audio.is_empty() {
                info!("Stream: {}", track.audio);
            }
            if !track.image.is_empty() {
                info!("Artwork: {}", track.image);
            }
        }
        None => warning!("No cached track with id {}.", id),
    }
}
