use std::sync::Arc;

use reqwest::{Client, Url};

use crate::{
    config::Settings,
    error::AuthError,
    management::CredentialStore,
    types::{AuthOutcome, TokenGrant},
    warning,
};

/// Fixed identity of this application towards the Jamendo OAuth endpoints.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub signup_url: String,
}

impl From<&Settings> for ClientIdentity {
    fn from(settings: &Settings) -> Self {
        ClientIdentity {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            scope: settings.scope.clone(),
            auth_url: settings.auth_url.clone(),
            token_url: settings.token_url.clone(),
            signup_url: settings.signup_url.clone(),
        }
    }
}

/// Drives the authorization-code and refresh-token exchanges.
///
/// Holds no state between calls beyond the client identity; tokens live
/// only in the [`CredentialStore`].
///
/// # Exchange Flow
///
/// 1. [`begin_authorization`](Self::begin_authorization) opens the authorize
///    page in the browser
/// 2. The provider redirects to the configured redirect URI with a `code`
/// 3. [`complete_authorization`](Self::complete_authorization) trades the code
///    for a token pair and persists it
/// 4. [`refresh_access_token`](Self::refresh_access_token) renews the pair
///    once the access token has expired
///
/// Every exchange is a single attempt with the transport's default timeout.
pub struct AuthManager {
    client: Client,
    identity: ClientIdentity,
    store: Arc<CredentialStore>,
}

impl AuthManager {
    pub fn new(identity: ClientIdentity, store: Arc<CredentialStore>) -> Self {
        Self::with_client(Client::new(), identity, store)
    }

    pub fn with_client(client: Client, identity: ClientIdentity, store: Arc<CredentialStore>) -> Self {
        Self {
            client,
            identity,
            store,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.identity.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.identity.redirect_uri
    }

    /// Builds the authorize URL the user has to visit.
    pub fn authorization_url(&self) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.identity.auth_url,
            &[
                ("client_id", self.identity.client_id.as_str()),
                ("audio_format", "mp3"),
                ("redirect_uri", self.identity.redirect_uri.as_str()),
                ("scope", self.identity.scope.as_str()),
                ("response_type", "code"),
            ],
        )
        .map_err(|e| AuthError::Authorization(format!("invalid authorization URL: {}", e)))
    }

    /// Opens the authorize page in the default browser.
    ///
    /// Falls back to printing the URL when no browser can be launched. Safe to
    /// call repeatedly; every call opens a new page.
    pub fn begin_authorization(&self) -> Result<(), AuthError> {
        let auth_url = self.authorization_url()?;
        log::debug!("starting authorization at {}", self.identity.auth_url);
        open_in_browser(auth_url.as_str());
        Ok(())
    }

    /// Opens the provider's account sign-up page.
    pub fn begin_sign_up(&self) {
        log::debug!("opening sign-up page {}", self.identity.signup_url);
        open_in_browser(&self.identity.signup_url);
    }

    /// Exchanges the `code` carried by `redirect_uri` for a token pair and
    /// persists it.
    ///
    /// A redirect without a usable `code` fails with
    /// [`AuthError::Authorization`] before any network traffic.
    pub async fn complete_authorization(&self, redirect_uri: &str) -> AuthOutcome {
        let code = match extract_code(redirect_uri) {
            Some(code) => code,
            None => {
                log::warn!("no authorization code in redirect");
                return Err(AuthError::no_code());
            }
        };

        let grant = self
            .request_tokens(&[
                ("client_id", self.identity.client_id.as_str()),
                ("client_secret", self.identity.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", self.identity.redirect_uri.as_str()),
            ])
            .await
            .inspect_err(|e| log::error!("exchanging code for token failed: {}", e))?;

        self.persist(&grant).await?;
        Ok(grant)
    }

    /// Trades the stored refresh token for a new token pair and persists it.
    pub async fn refresh_access_token(&self) -> AuthOutcome {
        let refresh_token = match self.store.refresh_token() {
            Some(token) => token,
            None => return Err(AuthError::no_refresh_token()),
        };

        let grant = self
            .request_tokens(&[
                ("client_id", self.identity.client_id.as_str()),
                ("client_secret", self.identity.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .await
            .inspect_err(|e| log::error!("refreshing access token failed: {}", e))?;

        self.persist(&grant).await?;
        Ok(grant)
    }

    async fn persist(&self, grant: &TokenGrant) -> Result<(), AuthError> {
        self.store
            .save_tokens(&grant.access_token, &grant.refresh_token, grant.expires_in)
            .await?;
        Ok(())
    }

    async fn request_tokens(&self, form: &[(&str, &str)]) -> Result<TokenGrant, AuthError> {
        let res = self
            .client
            .post(&self.identity.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Network(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let grant: TokenGrant =
            serde_json::from_str(&body).map_err(|e| AuthError::Parse(e.to_string()))?;

        if grant.access_token.is_empty() || grant.refresh_token.is_empty() {
            return Err(AuthError::Parse("empty token in response".to_string()));
        }
        if grant.expires_in < 0 {
            return Err(AuthError::Parse(format!(
                "negative token lifetime {}",
                grant.expires_in
            )));
        }

        Ok(grant)
    }
}

/// Returns the non-empty `code` query parameter of `redirect_uri`.
pub fn extract_code(redirect_uri: &str) -> Option<String> {
    let url = Url::parse(redirect_uri).ok()?;
    let code = url
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty());

    if code.is_none() {
        if let Some((_, error)) = url.query_pairs().find(|(key, _)| key == "error") {
            log::warn!("authorization redirect carried error: {}", error);
        }
    }

    code
}

fn open_in_browser(url: &str) {
    if webbrowser::open(url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        )
    }
}
