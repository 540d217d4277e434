use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};

use crate::{error::StoreError, types::CredentialRecord, utils};

/// Durable store for the access token, refresh token and expiry.
///
/// Share one instance per process (`Arc<CredentialStore>`). The record is
/// kept in a watch channel so every reader sees whole records, and writes are
/// serialized so the file and the published record never disagree.
pub struct CredentialStore {
    path: PathBuf,
    record: watch::Sender<CredentialRecord>,
    write_lock: Mutex<()>,
}

impl CredentialStore {
    /// Opens the store at `path`. A missing file means no credentials yet.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let record = match async_fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CredentialRecord::default(),
            Err(e) => return Err(e.into()),
        };

        log::debug!(
            "opened credential store at {} (tokens present: {})",
            path.display(),
            record.access_token.is_some()
        );

        Ok(Self {
            path,
            record: watch::Sender::new(record),
            write_lock: Mutex::new(()),
        })
    }

    /// Receiver that observes every future change of the record.
    pub fn subscribe(&self) -> watch::Receiver<CredentialRecord> {
        self.record.subscribe()
    }

    pub fn snapshot(&self) -> CredentialRecord {
        self.record.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.record.borrow().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.record.borrow().refresh_token.clone()
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.record.borrow().expires_at()
    }

    /// Stores a token pair issued now that lives for `expires_in` seconds.
    pub async fn save_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
    ) -> Result<CredentialRecord, StoreError> {
        self.save_tokens_issued_at(access_token, refresh_token, expires_in, Utc::now())
            .await
    }

    /// Stores a token pair issued at `issued_at`; the expiry is
    /// `issued_at + expires_in` seconds, clamped to the `i64` range.
    pub async fn save_tokens_issued_at(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<CredentialRecord, StoreError> {
        let record = CredentialRecord {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
            expiry_ms: Some(
                issued_at
                    .timestamp_millis()
                    .saturating_add(expires_in.saturating_mul(1000)),
            ),
        };

        let _guard = self.write_lock.lock().await;
        let json = serde_json::to_vec_pretty(&record)?;
        utils::write_atomic(&self.path, &json).await?;
        self.record.send_replace(record.clone());

        log::debug!("saved tokens, expiring in {}s", expires_in);
        Ok(record)
    }

    /// Removes all three fields.
    pub async fn clear_tokens(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        utils::remove_if_exists(&self.path).await?;
        self.record.send_replace(CredentialRecord::default());

        log::debug!("cleared stored tokens");
        Ok(())
    }
}
