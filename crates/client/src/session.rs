//! Session collaborator: token storage, expiry checks, and the refresh
//! exchange.
//!
//! The request pipeline never mutates session state itself; it only reads
//! the current tokens through [`SessionProvider`]. The concrete
//! [`SessionManager`] reuses the access token while its absolute expiry has
//! not passed and performs the refresh exchange once it has.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::token::decode_expiry_ms;

/// The current session's token set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Short-lived bearer credential attached to authenticated requests.
    pub access_token: String,
    /// Long-lived credential traded for new access tokens.
    pub refresh_token: String,
    /// Absolute access-token expiry, epoch-milliseconds.
    pub expires_at_ms: i64,
}

impl SessionTokens {
    /// Whether the access token has passed its absolute expiry.
    #[must_use]
    pub const fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Source of the current session for the request pipeline.
///
/// `Ok(None)` means signed out; `Err` means the lookup itself failed, which
/// aborts the request it was fetched for.
#[allow(async_fn_in_trait)]
pub trait SessionProvider {
    /// Fetch the current session, refreshing it if the provider chooses to.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the lookup (or an attempted refresh)
    /// fails.
    async fn current_session(&self) -> Result<Option<SessionTokens>, SessionError>;
}

impl<P: SessionProvider + ?Sized> SessionProvider for std::sync::Arc<P> {
    async fn current_session(&self) -> Result<Option<SessionTokens>, SessionError> {
        self.as_ref().current_session().await
    }
}

/// Token endpoint response for the refresh exchange.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Default)]
struct SessionState {
    tokens: Option<SessionTokens>,
    error: bool,
}

/// Owns the session tokens and the refresh exchange against the token
/// endpoint.
///
/// On a failed refresh the manager records an error flag; upstream UI reacts
/// to [`Self::has_error`] by forcing sign-out. The manager (and the pipeline
/// above it) never signs out on its own.
pub struct SessionManager {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    state: Mutex<SessionState>,
}

impl SessionManager {
    /// Create a session manager from client configuration.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.expose_secret().to_string(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Install a token set, e.g. after a completed login flow.
    ///
    /// Clears any prior error flag.
    pub fn sign_in(&self, tokens: SessionTokens) {
        let mut state = self.lock_state();
        state.tokens = Some(tokens);
        state.error = false;
    }

    /// Drop the current token set.
    pub fn sign_out(&self) {
        let mut state = self.lock_state();
        state.tokens = None;
        state.error = false;
    }

    /// Whether the last refresh exchange failed.
    ///
    /// The flag stays set until the next successful refresh, sign-in, or
    /// sign-out.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.lock_state().error
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Trade the refresh token for a new access token.
    async fn refresh_exchange(&self, refresh_token: &str) -> Result<SessionTokens, SessionError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", refresh_token),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SessionError::Refresh { status, detail });
        }

        let token_response: TokenResponse = response.json().await?;

        // The stored expiry comes from the new token's own exp claim; fall
        // back to the advertised lifetime for opaque tokens.
        let now_ms = Utc::now().timestamp_millis();
        let expires_at_ms = decode_expiry_ms(&token_response.access_token)
            .unwrap_or_else(|| now_ms + token_response.expires_in * 1000);

        Ok(SessionTokens {
            access_token: token_response.access_token,
            refresh_token: token_response
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
            expires_at_ms,
        })
    }
}

impl SessionProvider for SessionManager {
    async fn current_session(&self) -> Result<Option<SessionTokens>, SessionError> {
        let current = self.lock_state().tokens.clone();
        let Some(tokens) = current else {
            return Ok(None);
        };

        if !tokens.is_expired(Utc::now().timestamp_millis()) {
            return Ok(Some(tokens));
        }

        debug!("Access token expired, performing refresh exchange");
        match self.refresh_exchange(&tokens.refresh_token).await {
            Ok(fresh) => {
                let mut state = self.lock_state();
                state.tokens = Some(fresh.clone());
                state.error = false;
                Ok(Some(fresh))
            }
            Err(e) => {
                warn!("Token refresh failed: {e}");
                self.lock_state().error = true;
                Err(e)
            }
        }
    }
}
