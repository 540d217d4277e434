use reqwest::Client;

use crate::{
    error::CacheError,
    types::{RemoteTrack, TracksResponse},
};

/// Client for the catalog's track listing endpoint.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    api_url: String,
}

impl CatalogClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_url)
    }

    pub fn with_client(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches one page of tracks visible to `access_token`.
    ///
    /// Single attempt. No pagination: whatever the first page holds is the
    /// whole listing.
    ///
    /// # Errors
    ///
    /// - [`CacheError::Network`] on transport failure or a non-success status
    /// - [`CacheError::Parse`] when the body is not a track listing
    /// - [`CacheError::Api`] when the catalog reports `status: failed`
    pub async fn fetch_tracks(
        &self,
        access_token: &str,
        client_id: &str,
    ) -> Result<Vec<RemoteTrack>, CacheError> {
        let api_url = format!("{uri}/tracks/", uri = self.api_url);

        let response = self
            .client
            .get(&api_url)
            .query(&[
                ("client_id", client_id),
                ("access_token", access_token),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| CacheError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CacheError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(CacheError::Network(format!(
                "track listing returned {}",
                status
            )));
        }

        let res: TracksResponse =
            serde_json::from_str(&body).map_err(|e| CacheError::Parse(e.to_string()))?;

        if let Some(headers) = &res.headers {
            if headers.status.as_deref() == Some("failed") {
                return Err(CacheError::Api(
                    headers
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "request failed".to_string()),
                ));
            }
        }

        log::debug!("catalog returned {} tracks", res.results.len());
        Ok(res.results)
    }
}
