mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{CLIENT_ID, MockJamendo, TestDir, remote_track, tracks_body};
use harmonyhub::{
    error::CacheError,
    management::TrackCache,
    types::{RefreshStatus, Track, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_NAME},
};
use serde_json::json;

async fn open_cache(mock: &MockJamendo, dir: &TestDir) -> TrackCache {
    TrackCache::open(dir.tracks_path(), mock.catalog()).await.unwrap()
}

fn sorted_ids(tracks: &[Track]) -> Vec<String> {
    let mut ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
    ids.sort();
    ids
}

fn track(id: &str, name: &str, artist: &str) -> Track {
    Track {
        id: id.to_string(),
        name: name.to_string(),
        artist_name: artist.to_string(),
        album_name: "Album".to_string(),
        image: String::new(),
        audio: String::new(),
    }
}

#[tokio::test]
async fn test_refresh_replaces_cache_with_listing() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    mock.respond_tracks(
        StatusCode::OK,
        tracks_body(vec![
            remote_track("1", "One", "Alpha"),
            remote_track("2", "Two", "Beta"),
            remote_track("3", "Three", "Gamma"),
        ]),
    )
    .await;

    assert_eq!(cache.refresh("token", CLIENT_ID).await.unwrap(), 3);
    assert_eq!(cache.list_all().current().len(), 3);

    // Same listing again must not accumulate.
    assert_eq!(cache.refresh("token", CLIENT_ID).await.unwrap(), 3);
    assert_eq!(cache.list_all().current().len(), 3);
    assert_eq!(mock.track_calls(), 2);
}

#[tokio::test]
async fn test_refresh_sends_credentials_as_query() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    cache.refresh("token-abc", CLIENT_ID).await.unwrap();

    let query = mock.last_track_query().await.unwrap();
    assert_eq!(query.get("client_id").map(String::as_str), Some(CLIENT_ID));
    assert_eq!(query.get("access_token").map(String::as_str), Some("token-abc"));
    assert_eq!(query.get("format").map(String::as_str), Some("json"));
}

#[tokio::test]
async fn test_fields_are_stored_verbatim() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    mock.respond_tracks(StatusCode::OK, tracks_body(vec![])).await;
    cache.refresh("token", CLIENT_ID).await.unwrap();

    mock.respond_tracks(
        StatusCode::OK,
        tracks_body(vec![json!({
            "id": "42",
            "name": "Song",
            "artistName": "Band",
            "albumName": "Album",
            "image": "http://x/i.png",
            "audio": "http://x/a.mp3",
        })]),
    )
    .await;
    cache.refresh("token", CLIENT_ID).await.unwrap();

    let expected = Track {
        id: "42".to_string(),
        name: "Song".to_string(),
        artist_name: "Band".to_string(),
        album_name: "Album".to_string(),
        image: "http://x/i.png".to_string(),
        audio: "http://x/a.mp3".to_string(),
    };
    assert_eq!(cache.list_all().current(), vec![expected.clone()]);
    assert_eq!(cache.get_by_id("42").current(), Some(expected));
}

#[tokio::test]
async fn test_empty_listing_then_single_track() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    mock.respond_tracks(StatusCode::OK, tracks_body(vec![])).await;
    assert_eq!(cache.refresh("token", CLIENT_ID).await.unwrap(), 0);
    assert!(cache.is_empty());

    mock.respond_tracks(StatusCode::OK, tracks_body(vec![remote_track("7", "Seven", "Band")]))
        .await;
    assert_eq!(cache.refresh("token", CLIENT_ID).await.unwrap(), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_missing_fields_get_placeholders() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    mock.respond_tracks(
        StatusCode::OK,
        tracks_body(vec![json!({
            "id": 9,
            "name": null,
            "artist_name": null,
        })]),
    )
    .await;
    cache.refresh("token", CLIENT_ID).await.unwrap();

    let stored = cache.get_by_id("9").current().unwrap();
    assert_eq!(stored.name, UNKNOWN_NAME);
    assert_eq!(stored.artist_name, UNKNOWN_ARTIST);
    assert_eq!(stored.album_name, UNKNOWN_ALBUM);
    assert_eq!(stored.image, "");
    assert_eq!(stored.audio, "");
}

#[tokio::test]
async fn test_snake_case_fields_are_accepted() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    mock.respond_tracks(
        StatusCode::OK,
        tracks_body(vec![json!({
            "id": "5",
            "name": "Five",
            "artist_name": "Snake",
            "album_name": "Case",
        })]),
    )
    .await;
    cache.refresh("token", CLIENT_ID).await.unwrap();

    let stored = cache.get_by_id("5").current().unwrap();
    assert_eq!(stored.artist_name, "Snake");
    assert_eq!(stored.album_name, "Case");
}

#[tokio::test]
async fn test_search_matches_name_or_artist() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    cache
        .replace_snapshot(vec![
            track("1", "Morning Song", "Alpha"),
            track("2", "Evening", "Songbirds"),
            track("3", "Night", "Gamma"),
        ])
        .await
        .unwrap();

    let mut ids: Vec<String> = cache
        .search("Song")
        .current()
        .into_iter()
        .map(|t| t.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["1", "2"]);

    let mut lower: Vec<String> = cache
        .search("song")
        .current()
        .into_iter()
        .map(|t| t.id)
        .collect();
    lower.sort();
    assert_eq!(lower, vec!["1", "2"]);
    assert_eq!(cache.search("NIGHT").current().len(), 1);
    assert!(cache.search("Nothing").current().is_empty());
    assert_eq!(cache.search("").current().len(), 3);
}

#[tokio::test]
async fn test_get_by_id_unknown_is_none() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    cache.replace_snapshot(vec![track("1", "One", "Alpha")]).await.unwrap();

    assert!(cache.get_by_id("1").current().is_some());
    assert!(cache.get_by_id("2").current().is_none());
}

#[tokio::test]
async fn test_views_observe_replacement() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    let mut all = cache.list_all();
    let mut found = cache.get_by_id("3");
    assert!(all.current().is_empty());
    assert!(found.current().is_none());

    mock.respond_tracks(
        StatusCode::OK,
        tracks_body(vec![remote_track("3", "Three", "Gamma")]),
    )
    .await;
    cache.refresh("token", CLIENT_ID).await.unwrap();

    let tracks = tokio::time::timeout(Duration::from_secs(5), all.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tracks.len(), 1);

    let track = tokio::time::timeout(Duration::from_secs(5), found.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(track.map(|t| t.name), Some("Three".to_string()));
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    mock.respond_tracks(
        StatusCode::OK,
        tracks_body(vec![remote_track("1", "One", "Alpha"), remote_track("2", "Two", "Beta")]),
    )
    .await;
    cache.refresh("token", CLIENT_ID).await.unwrap();
    assert!(matches!(
        *cache.refresh_status().borrow(),
        RefreshStatus::Succeeded { count: 2, .. }
    ));

    mock.respond_tracks(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    let err = cache.refresh("token", CLIENT_ID).await.unwrap_err();
    assert!(matches!(err, CacheError::Network(_)));
    assert_eq!(cache.len(), 2);
    assert!(matches!(
        *cache.refresh_status().borrow(),
        RefreshStatus::Failed { .. }
    ));

    mock.respond_tracks(StatusCode::OK, "not json").await;
    let err = cache.refresh("token", CLIENT_ID).await.unwrap_err();
    assert!(matches!(err, CacheError::Parse(_)));
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_failed_api_status_is_reported() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    mock.respond_tracks(
        StatusCode::OK,
        json!({
            "headers": {
                "status": "failed",
                "code": 5,
                "error_message": "Invalid access token",
            },
            "results": [],
        })
        .to_string(),
    )
    .await;

    match cache.refresh("token", CLIENT_ID).await {
        Err(CacheError::Api(message)) => assert_eq!(message, "Invalid access token"),
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicate_ids_collapse_to_last() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    mock.respond_tracks(
        StatusCode::OK,
        tracks_body(vec![
            remote_track("1", "First", "Alpha"),
            remote_track("2", "Two", "Beta"),
            remote_track("1", "Second", "Alpha"),
        ]),
    )
    .await;

    assert_eq!(cache.refresh("token", CLIENT_ID).await.unwrap(), 2);
    let tracks = cache.list_all().current();
    assert_eq!(tracks[0].id, "1");
    assert_eq!(tracks[0].name, "Second");
    assert_eq!(tracks[1].id, "2");
}

#[tokio::test]
async fn test_snapshot_survives_reopen() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    {
        let cache = open_cache(&mock, &dir).await;
        cache
            .replace_snapshot(vec![track("1", "One", "Alpha"), track("2", "Two", "Beta")])
            .await
            .unwrap();
    }

    let reopened = open_cache(&mock, &dir).await;
    assert_eq!(reopened.len(), 2);
    assert_eq!(
        reopened.get_by_id("2").current().map(|t| t.name),
        Some("Two".to_string())
    );
}

#[tokio::test]
async fn test_concurrent_refreshes_publish_whole_snapshots() {
    let mock = MockJamendo::start().await;
    let dir = TestDir::new();
    let cache = open_cache(&mock, &dir).await;

    cache
        .replace_snapshot(vec![track("old", "Old", "Previous")])
        .await
        .unwrap();

    let first = vec!["a1", "a2", "a3"];
    let second = vec!["b1", "b2"];
    mock.respond_tracks_for(
        "token-a",
        tracks_body(first.iter().map(|id| remote_track(id, "A", "Alpha")).collect()),
    )
    .await;
    mock.respond_tracks_for(
        "token-b",
        tracks_body(second.iter().map(|id| remote_track(id, "B", "Beta")).collect()),
    )
    .await;

    let mut view = cache.list_all();
    view.current();

    let watcher = async {
        let mut seen = Vec::new();
        while seen.len() < 2 {
            match tokio::time::timeout(Duration::from_secs(2), view.changed()).await {
                Ok(Some(tracks)) => seen.push(tracks),
                _ => break,
            }
        }
        seen
    };

    let (a, b, seen) = tokio::join!(
        cache.refresh("token-a", CLIENT_ID),
        cache.refresh("token-b", CLIENT_ID),
        watcher,
    );
    assert_eq!(a.unwrap(), 3);
    assert_eq!(b.unwrap(), 2);

    assert!(!seen.is_empty());
    for snapshot in &seen {
        let snapshot_ids = sorted_ids(snapshot);
        assert!(
            snapshot_ids == first || snapshot_ids == second,
            "partial or merged snapshot: {:?}",
            snapshot_ids
        );
    }

    let last = sorted_ids(&cache.list_all().current());
    assert!(last == first || last == second);
    assert_eq!(mock.track_calls(), 2);
}
