use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use tokio::sync::{Mutex, watch};

use crate::{
    error::{CacheError, StoreError},
    jamendo::CatalogClient,
    types::{RefreshStatus, Track},
    utils,
};

type Snapshot = Arc<Vec<Track>>;
type Selector<T> = Arc<dyn Fn(&[Track]) -> T + Send + Sync>;

/// Live projection over the track cache.
///
/// `current` evaluates the projection against the latest snapshot;
/// `changed` waits for the next snapshot replacement and evaluates it again.
pub struct TrackView<T> {
    rx: watch::Receiver<Snapshot>,
    select: Selector<T>,
}

impl<T> TrackView<T> {
    fn new(rx: watch::Receiver<Snapshot>, select: Selector<T>) -> Self {
        Self { rx, select }
    }

    pub fn current(&mut self) -> T {
        let snapshot = self.rx.borrow_and_update();
        (self.select)(snapshot.as_slice())
    }

    /// Waits for the next snapshot. Returns `None` once the cache is dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }
}

/// Local mirror of the catalog's track listing.
///
/// Holds exactly the last full snapshot fetched from the catalog. Each
/// refresh replaces it wholesale: the file is swapped by rename and the
/// in-memory snapshot by a single channel send, and refreshes are serialized,
/// so no reader ever sees an empty or half-written cache.
pub struct TrackCache {
    path: PathBuf,
    catalog: CatalogClient,
    snapshot: watch::Sender<Snapshot>,
    status: watch::Sender<RefreshStatus>,
    refresh_lock: Mutex<()>,
}

impl TrackCache {
    /// Opens the cache stored at `path`. A missing file means an empty cache.
    pub async fn open(path: PathBuf, catalog: CatalogClient) -> Result<Self, StoreError> {
        let tracks: Vec<Track> = match async_fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        log::debug!(
            "opened track cache at {} with {} tracks",
            path.display(),
            tracks.len()
        );

        Ok(Self {
            path,
            catalog,
            snapshot: watch::Sender::new(Arc::new(tracks)),
            status: watch::Sender::new(RefreshStatus::Never),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn list_all(&self) -> TrackView<Vec<Track>> {
        TrackView::new(
            self.snapshot.subscribe(),
            Arc::new(|tracks: &[Track]| tracks.to_vec()),
        )
    }

    /// Tracks whose name or artist name contains `query`.
    pub fn search(&self, query: &str) -> TrackView<Vec<Track>> {
        let query = query.to_string();
        TrackView::new(
            self.snapshot.subscribe(),
            Arc::new(move |tracks: &[Track]| {
                tracks
                    .iter()
                    .filter(|t| utils::track_matches(t, &query))
                    .cloned()
                    .collect()
            }),
        )
    }

    pub fn get_by_id(&self, id: &str) -> TrackView<Option<Track>> {
        let id = id.to_string();
        TrackView::new(
            self.snapshot.subscribe(),
            Arc::new(move |tracks: &[Track]| tracks.iter().find(|t| t.id == id).cloned()),
        )
    }

    pub fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn refresh_status(&self) -> watch::Receiver<RefreshStatus> {
        self.status.subscribe()
    }

    /// Replaces the cache with the catalog's current listing.
    ///
    /// On failure the previous snapshot stays in place, the failure is
    /// logged and published as [`RefreshStatus::Failed`], and the error is
    /// returned so callers can tell stale data from fresh data.
    pub async fn refresh(&self, access_token: &str, client_id: &str) -> Result<usize, CacheError> {
        let _guard = self.refresh_lock.lock().await;

        match self.fetch_and_store(access_token, client_id).await {
            Ok(count) => {
                log::info!("track cache refreshed with {} tracks", count);
                self.status.send_replace(RefreshStatus::Succeeded {
                    count,
                    at: Utc::now(),
                });
                Ok(count)
            }
            Err(e) => {
                log::warn!("track cache refresh failed, keeping previous snapshot: {}", e);
                self.status.send_replace(RefreshStatus::Failed {
                    reason: e.to_string(),
                    at: Utc::now(),
                });
                Err(e)
            }
        }
    }

    async fn fetch_and_store(&self, access_token: &str, client_id: &str) -> Result<usize, CacheError> {
        let remote = self.catalog.fetch_tracks(access_token, client_id).await?;
        let tracks: Vec<Track> = remote.into_iter().map(Track::from).collect();
        Ok(self.store_snapshot(tracks).await?)
    }

    /// Persists `tracks` as the new snapshot and publishes it. Duplicate ids
    /// collapse to the last occurrence.
    pub async fn replace_snapshot(&self, tracks: Vec<Track>) -> Result<usize, StoreError> {
        let _guard = self.refresh_lock.lock().await;
        self.store_snapshot(tracks).await
    }

    async fn store_snapshot(&self, tracks: Vec<Track>) -> Result<usize, StoreError> {
        let tracks = utils::dedupe_tracks(tracks);
        let json = serde_json::to_vec_pretty(&tracks)?;
        utils::write_atomic(&self.path, &json).await?;

        let count = tracks.len();
        self.snapshot.send_replace(Arc::new(tracks));
        Ok(count)
    }
}
