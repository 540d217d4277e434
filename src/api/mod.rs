//! # API Module
//!
//! HTTP endpoint served by the local callback server while `harmonyhub auth`
//! runs. The provider redirects the browser to the configured redirect URI;
//! [`callback`] hands the redirect to the sync orchestrator, which exchanges
//! the `code` for tokens and fills the track cache.
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use harmonyhub::api::{CallbackState, callback};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .layer(Extension(state));
//! ```

mod callback;

pub use callback::CallbackState;
pub use callback::callback;
pub use callback::rebuild_redirect_uri;
