use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use tabled::Tabled;

use crate::error::AuthError;

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Durable token triple. `expiry_ms` is a Unix timestamp in milliseconds and
/// is only ever derived from the issue time of the token pair it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expiry_ms: Option<i64>,
}

impl CredentialRecord {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry_ms.and_then(DateTime::from_timestamp_millis)
    }

    /// A record without an expiry counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry_ms {
            Some(expiry) => now.timestamp_millis() >= expiry,
            None => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.expiry_ms.is_none()
    }
}

/// Success payload of a token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Result of an authorization-code or refresh-token exchange.
pub type AuthOutcome = Result<TokenGrant, AuthError>;

/// A cached catalog track with placeholders already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist_name: String,
    pub album_name: String,
    pub image: String,
    pub audio: String,
}

impl From<RemoteTrack> for Track {
    fn from(remote: RemoteTrack) -> Self {
        Track {
            id: remote.id,
            name: remote.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            artist_name: remote
                .artist_name
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album_name: remote
                .album_name
                .unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            image: remote.image.unwrap_or_default(),
            audio: remote.audio.unwrap_or_default(),
        }
    }
}

/// Track as returned by the catalog. Both camelCase and snake_case field
/// names are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTrack {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "artistName", alias = "artist_name")]
    pub artist_name: Option<String>,
    #[serde(rename = "albumName", alias = "album_name")]
    pub album_name: Option<String>,
    pub image: Option<String>,
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TracksResponse {
    pub headers: Option<ResponseHeaders>,
    #[serde(default)]
    pub results: Vec<RemoteTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseHeaders {
    pub status: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
}

impl From<&Track> for TrackTableRow {
    fn from(track: &Track) -> Self {
        TrackTableRow {
            id: track.id.clone(),
            name: track.name.clone(),
            artist: track.artist_name.clone(),
            album: track.album_name.clone(),
        }
    }
}

/// Authentication state published by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub error: Option<String>,
}

/// One-shot navigation intent raised on authentication transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    NavigateToHome,
    NavigateToLogin,
}

/// Outcome of the most recent track cache refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RefreshStatus {
    #[default]
    Never,
    Succeeded {
        count: usize,
        at: DateTime<Utc>,
    },
    Failed {
        reason: String,
        at: DateTime<Utc>,
    },
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "track id must be a string or number, got {}",
            other
        ))),
    }
}
