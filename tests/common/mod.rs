#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Router,
    extract::{Form, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use harmonyhub::{
    jamendo::{AuthManager, CatalogClient, ClientIdentity},
    management::{CredentialStore, TrackCache},
    sync::SyncOrchestrator,
};
use reqwest::Client;
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::Mutex};

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";

/// Throw-away directory under the system temp dir, removed on drop.
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("harmonyhub-test-{:016x}", rand::random::<u64>()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.path.join("cache").join("credentials.json")
    }

    pub fn tracks_path(&self) -> PathBuf {
        self.path.join("cache").join("tracks.json")
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

struct Inner {
    token_response: Mutex<(StatusCode, String)>,
    tracks_response: Mutex<(StatusCode, String)>,
    tracks_by_token: Mutex<HashMap<String, String>>,
    token_calls: AtomicUsize,
    track_calls: AtomicUsize,
    grants: Mutex<Vec<HashMap<String, String>>>,
    track_queries: Mutex<Vec<HashMap<String, String>>>,
}

/// In-process stand-in for the Jamendo token and track endpoints.
#[derive(Clone)]
pub struct MockJamendo {
    addr: SocketAddr,
    inner: Arc<Inner>,
}

impl MockJamendo {
    pub async fn start() -> Self {
        let inner = Arc::new(Inner {
            token_response: Mutex::new((StatusCode::OK, token_body("access-1", "refresh-1", 3600))),
            tracks_response: Mutex::new((StatusCode::OK, tracks_body(vec![]))),
            tracks_by_token: Mutex::new(HashMap::new()),
            token_calls: AtomicUsize::new(0),
            track_calls: AtomicUsize::new(0),
            grants: Mutex::new(Vec::new()),
            track_queries: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mock = Self { addr, inner };

        let app = Router::new()
            .route("/oauth/grant", post(grant))
            .route("/tracks/", get(tracks))
            .with_state(mock.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        mock
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn identity(&self, redirect_uri: &str) -> ClientIdentity {
        ClientIdentity {
            client_id: CLIENT_ID.to_string(),
            client_secret: CLIENT_SECRET.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scope: "music".to_string(),
            auth_url: format!("{}/oauth/authorize", self.base_url()),
            token_url: format!("{}/oauth/grant", self.base_url()),
            signup_url: format!("{}/signup", self.base_url()),
        }
    }

    pub fn catalog(&self) -> CatalogClient {
        CatalogClient::with_client(http(), self.base_url())
    }

    pub async fn respond_token(&self, status: StatusCode, body: impl Into<String>) {
        *self.inner.token_response.lock().await = (status, body.into());
    }

    pub async fn respond_tracks(&self, status: StatusCode, body: impl Into<String>) {
        *self.inner.tracks_response.lock().await = (status, body.into());
    }

    /// Listing served to requests carrying `access_token`, overriding the
    /// default tracks response.
    pub async fn respond_tracks_for(&self, access_token: &str, body: impl Into<String>) {
        self.inner
            .tracks_by_token
            .lock()
            .await
            .insert(access_token.to_string(), body.into());
    }

    pub fn token_calls(&self) -> usize {
        self.inner.token_calls.load(Ordering::SeqCst)
    }

    pub fn track_calls(&self) -> usize {
        self.inner.track_calls.load(Ordering::SeqCst)
    }

    pub async fn last_grant(&self) -> Option<HashMap<String, String>> {
        self.inner.grants.lock().await.last().cloned()
    }

    pub async fn last_track_query(&self) -> Option<HashMap<String, String>> {
        self.inner.track_queries.lock().await.last().cloned()
    }
}

async fn grant(
    State(mock): State<MockJamendo>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    mock.inner.token_calls.fetch_add(1, Ordering::SeqCst);
    mock.inner.grants.lock().await.push(form);
    mock.inner.token_response.lock().await.clone()
}

async fn tracks(
    State(mock): State<MockJamendo>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    mock.inner.track_calls.fetch_add(1, Ordering::SeqCst);
    let by_token = match query.get("access_token") {
        Some(token) => mock.inner.tracks_by_token.lock().await.get(token).cloned(),
        None => None,
    };
    mock.inner.track_queries.lock().await.push(query);
    match by_token {
        Some(body) => (StatusCode::OK, body),
        None => mock.inner.tracks_response.lock().await.clone(),
    }
}

/// HTTP client that never goes through a proxy.
pub fn http() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

pub fn token_body(access: &str, refresh: &str, expires_in: i64) -> String {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": expires_in,
        "token_type": "bearer",
        "scope": "music",
    })
    .to_string()
}

pub fn tracks_body(results: Vec<Value>) -> String {
    json!({
        "headers": {
            "status": "success",
            "code": 0,
            "error_message": "",
            "results_count": results.len(),
        },
        "results": results,
    })
    .to_string()
}

pub fn remote_track(id: &str, name: &str, artist: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "artistName": artist,
        "albumName": "Album",
        "image": format!("http://x/{}.png", id),
        "audio": format!("http://x/{}.mp3", id),
    })
}

pub struct Harness {
    pub mock: MockJamendo,
    pub dir: TestDir,
    pub credentials: Arc<CredentialStore>,
    pub tracks: Arc<TrackCache>,
    pub auth: Arc<AuthManager>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_redirect("harmonyhub://callback").await
    }

    pub async fn with_redirect(redirect_uri: &str) -> Self {
        let mock = MockJamendo::start().await;
        let dir = TestDir::new();
        let credentials = Arc::new(CredentialStore::open(dir.credentials_path()).await.unwrap());
        let tracks = Arc::new(TrackCache::open(dir.tracks_path(), mock.catalog()).await.unwrap());
        let auth = Arc::new(AuthManager::with_client(
            http(),
            mock.identity(redirect_uri),
            Arc::clone(&credentials),
        ));

        Self {
            mock,
            dir,
            credentials,
            tracks,
            auth,
        }
    }

    pub async fn orchestrator(&self) -> Arc<SyncOrchestrator> {
        Arc::new(
            SyncOrchestrator::start(
                Arc::clone(&self.auth),
                Arc::clone(&self.credentials),
                Arc::clone(&self.tracks),
            )
            .await,
        )
    }
}
