//! Authenticated HTTP client for the Incydr REST API.
//!
//! `IncydrClient` wraps a `reqwest::Client` and a `TokenProvider` behind a
//! `Mutex`, providing JSON request helpers (`get`, `post`, `put`, ...) that
//! attach a bearer token to every request.
//!
//! Token lifecycle:
//! - Lazy acquisition: the first request that finds no cached token triggers
//!   `refresh_token()` via `bearer_token()`.
//! - Expiry-aware: `TokenProvider::token()` returns `None` once the token's
//!   reported lifetime has elapsed, which triggers a refresh on the next
//!   request.
//! - No status-based retry, except `429` on requests sent through
//!   `post_with_retry` (used by file-event search).
//!
//! Per-tenant lookups that never change during a session (the tenant id and
//! the role list) are cached in `OnceCell` fields created empty at
//! construction and filled on first use.

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};

use crate::auth::TokenProvider;
use crate::error::{IncydrError, Result};
use crate::retry::RetryPolicy;
use crate::settings::{IncydrSettings, DEFAULT_PAGE_SIZE};
use crate::users::Role;

/// Connect timeout for API requests (TCP + TLS handshake).
const API_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout. File-event pages of 10 000 records can take a
/// while to assemble server-side.
const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn build_api_client(user_agent_prefix: Option<&str>) -> Result<Client> {
    let agent = format!("incydr-rust/{}", env!("CARGO_PKG_VERSION"));
    let agent = match user_agent_prefix {
        Some(prefix) => format!("{prefix} {agent}"),
        None => agent,
    };
    Ok(Client::builder()
        .connect_timeout(API_CONNECT_TIMEOUT)
        .timeout(API_REQUEST_TIMEOUT)
        .user_agent(agent)
        .build()?)
}

/// `GET /v1/customer` response; only the tenant id is needed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub tenant_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub registration_key: Option<String>,
}

/// Authenticated HTTP client for the Incydr REST API.
///
/// - `auth` is behind a `Mutex` because `refresh_token()` needs `&mut self`
///   while API methods only need `&self`. The lock is held for the token
///   check and refresh, never across an API round-trip.
/// - `base_url` is a `String` so tests can point it at a wiremock server.
pub struct IncydrClient {
    client: Client,
    base_url: String,
    auth: Mutex<TokenProvider>,
    retry: RetryPolicy,
    page_size: usize,
    tenant_id: OnceCell<String>,
    roles: OnceCell<Vec<Role>>,
}

impl IncydrClient {
    /// Builds a client from resolved settings. Fails with `Config` when the
    /// URL or credentials are missing.
    pub fn new(settings: &IncydrSettings) -> Result<Self> {
        let (url, client_id, client_secret) = settings.require_credentials()?;
        let auth = TokenProvider::new(url, client_id, client_secret)?;
        Ok(IncydrClient {
            client: build_api_client(settings.user_agent_prefix.as_deref())?,
            base_url: url.trim_end_matches('/').to_string(),
            auth: Mutex::new(auth),
            retry: RetryPolicy::default(),
            page_size: settings.page_size,
            tenant_id: OnceCell::new(),
            roles: OnceCell::new(),
        })
    }

    /// Constructor that accepts a custom base URL, used by tests to point
    /// at a local mock server.
    pub fn with_base_url(auth: TokenProvider, base_url: &str) -> Self {
        IncydrClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Mutex::new(auth),
            retry: RetryPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
            tenant_id: OnceCell::new(),
            roles: OnceCell::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Default page size for `iter_*` helpers.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The tenant id, fetched from `/v1/customer` once per client.
    pub async fn tenant_id(&self) -> Result<String> {
        let id = self
            .tenant_id
            .get_or_try_init(|| async {
                let customer: Customer = self.get("/v1/customer").await?;
                tracing::debug!(tenant_id = %customer.tenant_id, "resolved tenant");
                Ok::<_, IncydrError>(customer.tenant_id)
            })
            .await?;
        Ok(id.clone())
    }

    /// Cache slot for the tenant's role list, filled by `users::list_roles`.
    pub(crate) fn role_cache(&self) -> &OnceCell<Vec<Role>> {
        &self.roles
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Returns a valid bearer token, refreshing if none is cached or the
    /// cached one has expired.
    async fn bearer_token(&self) -> Result<String> {
        let mut auth = self.auth.lock().await;
        if auth.token().is_none() {
            auth.refresh_token().await?;
        }

        auth.token().map(str::to_owned).ok_or_else(|| IncydrError::Auth {
            message: "token missing after refresh".to_string(),
            source: None,
        })
    }

    /// Core HTTP method: sends an authenticated request and returns the
    /// response once its status is 2xx.
    ///
    /// When `retry_rate_limit` is set, `429` responses are retried per the
    /// client's `RetryPolicy`. Every other non-2xx status becomes
    /// `IncydrError::Api` carrying the response body.
    async fn execute<Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
        retry_rate_limit: bool,
    ) -> Result<Response>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            let token = self.bearer_token().await?;
            let mut req = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&token);
            if let Some(params) = query {
                req = req.query(params);
            }
            if let Some(payload) = body {
                req = req.json(payload);
            }

            tracing::debug!(%method, %url, attempt, "sending request");
            let resp = req.send().await?;
            let status = resp.status();

            if status == StatusCode::TOO_MANY_REQUESTS
                && retry_rate_limit
                && attempt < self.retry.max_retries
            {
                let delay = self.retry.delay_for(attempt, resp.headers().get(RETRY_AFTER));
                tracing::warn!(%url, attempt, ?delay, "rate limited, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                tracing::debug!(%url, %status, "request failed");
                return Err(IncydrError::Api { status, body });
            }
            return Ok(resp);
        }
    }

    async fn send_json<T, Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
        retry_rate_limit: bool,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let resp = self
            .execute(method, path, query, body, retry_rate_limit)
            .await?;
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sends an authenticated GET request and deserializes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json::<T, (), ()>(Method::GET, path, None, None, false)
            .await
    }

    /// GET with URL query parameters serialized from `query`.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send_json::<T, Q, ()>(Method::GET, path, Some(query), None, false)
            .await
    }

    /// Sends an authenticated POST request with a JSON body.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json::<T, (), B>(Method::POST, path, None, Some(body), false)
            .await
    }

    /// POST that retries `429` responses per the client's `RetryPolicy`.
    pub async fn post_with_retry<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json::<T, (), B>(Method::POST, path, None, Some(body), true)
            .await
    }

    /// POST whose response body is ignored.
    pub async fn post_no_content<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.execute::<(), B>(Method::POST, path, None, Some(body), false)
            .await?;
        Ok(())
    }

    /// Sends an authenticated PUT request with a JSON body.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json::<T, (), B>(Method::PUT, path, None, Some(body), false)
            .await
    }

    /// PUT whose response body is ignored.
    pub async fn put_no_content<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.execute::<(), B>(Method::PUT, path, None, Some(body), false)
            .await?;
        Ok(())
    }

    /// PATCH with both query parameters and a JSON body.
    pub async fn patch_with_query<Q, B, T>(&self, path: &str, query: &Q, body: &B) -> Result<T>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json::<T, Q, B>(Method::PATCH, path, Some(query), Some(body), false)
            .await
    }

    /// Sends an authenticated DELETE request. Response bodies are ignored.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute::<(), ()>(Method::DELETE, path, None, None, false)
            .await?;
        Ok(())
    }
}
