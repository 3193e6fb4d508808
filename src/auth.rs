//! OAuth2 client-credentials authentication for the Incydr API.
//!
//! Acquires bearer tokens from `{url}/v1/oauth` using HTTP Basic
//! authentication with the API client id and secret. The token is cached in
//! `TokenProvider` and refreshed on demand. Consumers (e.g. `IncydrClient`)
//! read the cached token via `token()` and call `refresh_token()` when it is
//! absent or stale.
//!
//! Token states: `NO_TOKEN -> VALID -> EXPIRED -> VALID -> ...`

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::{IncydrError, Result};

/// Path of the token endpoint, relative to the tenant URL.
const TOKEN_PATH: &str = "v1/oauth";

/// Connect and request timeout for token requests. Token responses are tiny.
const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Form body sent to the token endpoint.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    grant_type: &'a str,
}

/// The token endpoint response. Extra fields are ignored.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the token in seconds, counted from issue time.
    pub expires_in: u64,
}

/// Manages OAuth2 token acquisition and caching.
///
/// Invariants:
/// - `response` is `None` until the first successful `refresh_token()`.
/// - `acquired_at` is `Some` whenever `response` is `Some`.
/// - `token()` returns `None` once `acquired_at + expires_in` has passed.
pub struct TokenProvider {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    response: Option<TokenResponse>,
    acquired_at: Option<Instant>,
}

impl TokenProvider {
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Result<Self> {
        Self::with_timeout(base_url, client_id, client_secret, TOKEN_TIMEOUT)
    }

    /// Like [`TokenProvider::new`] with a custom token request timeout.
    pub fn with_timeout(
        base_url: &str,
        client_id: &str,
        client_secret: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(TokenProvider {
            client,
            base_url: base_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            response: None,
            acquired_at: None,
        })
    }

    /// Creates a `TokenProvider` holding a pre-set token that never
    /// contacts the token endpoint until it expires (3600s). Used by tests.
    pub fn with_token(token: &str) -> Self {
        TokenProvider {
            client: reqwest::Client::new(),
            base_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            response: Some(TokenResponse {
                access_token: token.to_string(),
                token_type: "bearer".to_string(),
                expires_in: 3600,
            }),
            acquired_at: Some(Instant::now()),
        }
    }

    fn token_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), TOKEN_PATH)
    }

    /// Fetches a new token and caches it.
    ///
    /// The body is read as text before the status check so the server's
    /// error description survives into `IncydrError::Auth`.
    pub async fn refresh_token(&mut self) -> Result<()> {
        let url = self.token_url();
        tracing::debug!(%url, "requesting access token");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&TokenRequest {
                grant_type: "client_credentials",
            })
            .send()
            .await
            .map_err(|e| IncydrError::Auth {
                message: format!("token request to {url} failed"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| IncydrError::Auth {
            message: "failed to read token response".to_string(),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(IncydrError::Auth {
                message: format!("token request failed ({status}): {body}"),
                source: None,
            });
        }

        let resp: TokenResponse = serde_json::from_str(&body).map_err(|e| IncydrError::Auth {
            message: "failed to parse token response".to_string(),
            source: Some(Box::new(e)),
        })?;
        tracing::debug!(expires_in = resp.expires_in, "access token refreshed");
        self.acquired_at = Some(Instant::now());
        self.response = Some(resp);

        Ok(())
    }

    /// Returns `true` if a token exists and its lifetime has elapsed.
    /// Returns `false` if no token is cached.
    fn is_expired(&self) -> bool {
        match (&self.response, self.acquired_at) {
            (Some(resp), Some(acquired)) => acquired.elapsed().as_secs() >= resp.expires_in,
            _ => false,
        }
    }

    /// Returns the cached access token, or `None` if no token exists or the
    /// token has expired.
    pub fn token(&self) -> Option<&str> {
        if self.is_expired() {
            return None;
        }
        self.response.as_ref().map(|ret| ret.access_token.as_str())
    }
}
