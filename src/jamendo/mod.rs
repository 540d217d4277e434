//! # Jamendo Integration Module
//!
//! HTTP clients for the two Jamendo surfaces this crate talks to:
//!
//! - [`auth`]: OAuth 2.0 authorization-code and refresh-token exchanges
//!   against `/oauth/grant`, plus the browser hand-off to `/oauth/authorize`
//! - [`tracks`]: the `/tracks/` listing used to refill the local cache
//!
//! ```text
//! Sync orchestrator / CLI
//!          ↓
//! Jamendo Integration Layer
//!     ├── AuthManager   (token exchange, persists via CredentialStore)
//!     └── CatalogClient (track listing)
//!          ↓
//! reqwest + serde_json
//! ```
//!
//! All calls are single attempts. Failures come back as typed errors
//! ([`crate::error::AuthError`], [`crate::error::CacheError`]) so callers can
//! branch on the kind of failure instead of its message.

pub mod auth;
pub mod tracks;

pub use auth::{AuthManager, ClientIdentity};
pub use tracks::CatalogClient;
