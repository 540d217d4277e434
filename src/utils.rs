use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Local, Utc};

use crate::{error::StoreError, types::Track};

/// Writes `contents` to a sibling temp file and renames it over `path`, so
/// readers of `path` see either the old or the new file, never a mix.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    async_fs::write(&tmp, contents).await?;
    async_fs::rename(&tmp, path).await?;
    Ok(())
}

/// Removes `path`, treating an already missing file as success.
pub async fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match async_fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Keeps one track per id. A later duplicate replaces the earlier one but
/// keeps the position of the first occurrence.
pub fn dedupe_tracks(tracks: Vec<Track>) -> Vec<Track> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Track> = Vec::with_capacity(tracks.len());

    for track in tracks {
        match positions.get(&track.id) {
            Some(&idx) => unique[idx] = track,
            None => {
                positions.insert(track.id.clone(), unique.len());
                unique.push(track);
            }
        }
    }

    unique
}

/// Substring match on name or artist name, ignoring ASCII case.
pub fn track_matches(track: &Track, query: &str) -> bool {
    contains_ignore_ascii_case(&track.name, query)
        || contains_ignore_ascii_case(&track.artist_name, query)
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

/// Human readable expiry, e.g. `2025-03-01 14:05 (in 42 min)`.
pub fn describe_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let local = expiry.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let minutes = (expiry - now).num_minutes();
    if minutes >= 0 {
        format!("{} (in {} min)", local, minutes)
    } else {
        format!("{} (expired {} min ago)", local, -minutes)
    }
}
