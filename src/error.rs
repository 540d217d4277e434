//! Error types shared across the crate.

use thiserror::Error;

/// Failure to read or write one of the local JSON stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Why an authorization-code or refresh-token exchange did not produce tokens.
///
/// Callers branch on the variant; the `Display` output is meant for humans.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The flow cannot proceed: no code in the redirect, no refresh token
    /// stored, or an unusable authorization URL.
    #[error("{0}")]
    Authorization(String),

    /// Transport failure or a non-success HTTP status from the token endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// The token endpoint answered with a body that is not a token grant.
    #[error("malformed token response: {0}")]
    Parse(String),

    /// Tokens were obtained but could not be persisted.
    #[error("credential storage failed: {0}")]
    Storage(#[from] StoreError),
}

impl AuthError {
    pub fn no_code() -> Self {
        AuthError::Authorization("No code received".to_string())
    }

    pub fn no_refresh_token() -> Self {
        AuthError::Authorization("No refresh token found".to_string())
    }
}

/// Why a track cache refresh was abandoned. The previous snapshot is kept.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("network error: {0}")]
    Network(String),

    /// The catalog answered but flagged the request as failed.
    #[error("catalog error: {0}")]
    Api(String),

    #[error("malformed catalog response: {0}")]
    Parse(String),

    #[error("track cache storage failed: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}
