//! Typed error hierarchy for the incydr crate.
//!
//! `IncydrError` keeps the diagnostic context of each failure boundary:
//! - `Auth` covers the `/v1/oauth` token endpoint.
//! - `Api` covers every other Incydr endpoint and keeps the response body,
//!   which carries the server's problem description.
//! - `Network` and `Parse` wrap transport and JSON failures.
//! - The lookup variants (`RoleNotFound`, `WatchlistNotFound`, ...) carry the
//!   identifier the caller supplied so CLI messages can name it.
//! - `Validation`, `DateParse` and `Config` are raised before any request is
//!   sent.

use reqwest::StatusCode;

/// Unified error type for all incydr library operations.
#[derive(Debug, thiserror::Error)]
pub enum IncydrError {
    /// Authentication failure at the token endpoint.
    ///
    /// Covers non-2xx responses from `/v1/oauth` (bad client id or secret,
    /// disabled API client), unreadable token responses, and a missing
    /// token after a refresh.
    #[error("authentication failed: {message}")]
    Auth {
        /// Human-readable description including HTTP status and body when
        /// available.
        message: String,
        /// The underlying transport or parse error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The Incydr API returned a non-success HTTP status code.
    #[error("API error {status}: {body}")]
    Api {
        /// The HTTP status code returned by the API.
        status: StatusCode,
        /// The raw response body text, or an empty string if it could not
        /// be read.
        body: String,
    },

    /// JSON deserialization failed when parsing an API response body.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A network-level failure (DNS, TCP, TLS, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A caller-supplied value was rejected before any request was sent
    /// (empty filter values, non-numeric comparison values, page sizes
    /// outside the server maximum, malformed bulk input).
    #[error("invalid input: {0}")]
    Validation(String),

    /// A date argument could not be interpreted as a timestamp or an
    /// ISO-8601 duration.
    #[error("unable to parse date '{input}': {reason}")]
    DateParse {
        /// The value exactly as the caller supplied it.
        input: String,
        /// Which formats were attempted.
        reason: String,
    },

    /// Required settings were missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A role name did not match any role in the tenant.
    #[error("role not found: {0}")]
    RoleNotFound(String),

    /// A role removal targeted a role the user does not hold.
    #[error("user {user_id} is not assigned role {role}")]
    UserNotAssignedRole {
        /// The user whose roles were being changed.
        user_id: String,
        /// The role name or id that was requested for removal.
        role: String,
    },

    /// A watchlist type or title did not match any watchlist.
    #[error("watchlist not found: {0}")]
    WatchlistNotFound(String),

    /// An actor name or id did not resolve to an actor.
    #[error("actor not found: {0}")]
    ActorNotFound(String),

    /// A lookup by name returned no match.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Resource kind, e.g. `"org"`.
        kind: &'static str,
        /// The name that was searched for.
        name: String,
    },

    /// A lookup by name returned more than one match.
    #[error("{count} {kind}s match '{name}', refusing to guess")]
    Ambiguous {
        /// Resource kind, e.g. `"org"`.
        kind: &'static str,
        /// The name that was searched for.
        name: String,
        /// Number of matches found.
        count: usize,
    },

    /// The checkpoint store could not be read or written.
    #[error("checkpoint store error at {path}: {message}")]
    Checkpoint {
        /// The store file.
        path: std::path::PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Some items of a bulk command failed. The individual failures have
    /// already been reported.
    #[error("{failed} of {total} items failed")]
    BulkFailed {
        /// Items that failed.
        failed: usize,
        /// Items attempted.
        total: usize,
    },

    /// Local file I/O failed (bulk input files, log files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A CSV bulk input file or CSV output could not be processed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl IncydrError {
    /// Returns the HTTP status when the error came from an API response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            IncydrError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, IncydrError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn auth_error_displays_message() {
        let err = IncydrError::Auth {
            message: "token request failed (401 Unauthorized): invalid_client".to_string(),
            source: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("authentication failed"));
        assert!(msg.contains("invalid_client"));
    }

    #[test]
    fn auth_error_with_source_chains_correctly() {
        let json_err: serde_json::Error = serde_json::from_str::<String>("not-json").unwrap_err();
        let err = IncydrError::Auth {
            message: "failed to parse token response".to_string(),
            source: Some(Box::new(json_err)),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn api_error_preserves_status_and_body() {
        let err = IncydrError::Api {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"problems":[{"type":"INVALID_PAGE_SIZE"}]}"#.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("INVALID_PAGE_SIZE"));
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn lookup_errors_name_the_identifier() {
        assert!(IncydrError::RoleNotFound("Desktop User".into())
            .to_string()
            .contains("Desktop User"));
        assert!(IncydrError::WatchlistNotFound("DEPARTING_EMPLOYEE".into())
            .to_string()
            .contains("DEPARTING_EMPLOYEE"));
        let err = IncydrError::UserNotAssignedRole {
            user_id: "user-1".into(),
            role: "Customer Cloud Admin".into(),
        };
        assert!(err.to_string().contains("user-1"));
        assert!(err.to_string().contains("Customer Cloud Admin"));
    }

    #[test]
    fn ambiguous_error_reports_match_count() {
        let err = IncydrError::Ambiguous {
            kind: "org",
            name: "Sales".into(),
            count: 3,
        };
        assert_eq!(err.to_string(), "3 orgs match 'Sales', refusing to guess");
    }

    #[test]
    fn parse_error_wraps_serde_json() {
        let json_err: serde_json::Error =
            serde_json::from_str::<String>("{{bad json}}").unwrap_err();
        let err = IncydrError::Parse(json_err);
        assert!(err.to_string().contains("failed to parse response"));
        assert!(err.source().is_some());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IncydrError>();
    }
}
