mod credentials;
mod tracks;

pub use credentials::CredentialStore;
pub use tracks::TrackCache;
pub use tracks::TrackView;
