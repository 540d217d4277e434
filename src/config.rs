//! Configuration management for harmonyhub.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in `<data dir>/harmonyhub/`
//! 3. Built-in Jamendo defaults for everything except the client keys

use std::{
    env,
    path::{Path, PathBuf},
};

use crate::error::ConfigError;

pub const JAMENDO_AUTH_URL: &str = "https://api.jamendo.com/v3.0/oauth/authorize";
pub const JAMENDO_TOKEN_URL: &str = "https://api.jamendo.com/v3.0/oauth/grant";
pub const JAMENDO_API_URL: &str = "https://api.jamendo.com/v3.0";
pub const JAMENDO_SIGNUP_URL: &str = "https://www.jamendo.com/signup";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_SCOPE: &str = "music";

const APP_DIR: &str = "harmonyhub";

/// Loads environment variables from `<data dir>/harmonyhub/.env`.
///
/// Creates the directory if needed. A missing `.env` file is not an error:
/// the variables may come from the process environment instead.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or an existing `.env`
/// file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = app_data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.is_file() {
        log::debug!("no .env file at {}", path.display());
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| e.to_string())?;
    Ok(())
}

/// Platform data directory for the application, e.g.
/// `~/.local/share/harmonyhub` on Linux.
pub fn app_data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub signup_url: String,
    pub server_address: String,
    pub data_dir: PathBuf,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            client_id: require("JAMENDO_CLIENT_ID")?,
            client_secret: require("JAMENDO_CLIENT_SECRET")?,
            redirect_uri: or_default("JAMENDO_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            scope: or_default("JAMENDO_AUTH_SCOPE", DEFAULT_SCOPE),
            auth_url: or_default("JAMENDO_AUTH_URL", JAMENDO_AUTH_URL),
            token_url: or_default("JAMENDO_TOKEN_URL", JAMENDO_TOKEN_URL),
            api_url: or_default("JAMENDO_API_URL", JAMENDO_API_URL)
                .trim_end_matches('/')
                .to_string(),
            signup_url: or_default("JAMENDO_SIGNUP_URL", JAMENDO_SIGNUP_URL),
            server_address: or_default("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            data_dir: get("HARMONYHUB_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(app_data_dir),
        })
    }

    /// Location of the persisted credential record.
    pub fn credentials_path(&self) -> PathBuf {
        cache_file(&self.data_dir, "credentials.json")
    }

    /// Location of the persisted track snapshot.
    pub fn tracks_path(&self) -> PathBuf {
        cache_file(&self.data_dir, "tracks.json")
    }
}

fn cache_file(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join("cache").join(name)
}
