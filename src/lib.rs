//! Async Rust client library and CLI for the Code42 Incydr REST API.
//!
//! Provides OAuth2 client-credentials authentication, an authenticated HTTP
//! client, query builders for file-event and alert search, lazy pagination,
//! resumable searches and one module per Incydr resource.
//!
//! # Modules
//!
//! - [`auth`]: client-credentials token provider with expiry tracking.
//! - [`client`]: authenticated HTTP wrapper for the Incydr REST API.
//! - [`error`]: typed error hierarchy (`IncydrError`) for all operations.
//! - [`settings`]: layered configuration (CLI args, env, `.env` files).
//! - [`queries`]: file-event and alert query builders.
//! - [`dates`]: absolute and relative date arguments.
//! - [`pagination`]: page-number and page-token record streams.
//! - [`checkpoint`]: resume points for repeated searches.
//! - [`bulk`]: batched operations with per-item fallback.
//! - Resources: [`file_events`], [`alerts`], [`cases`], [`users`],
//!   [`devices`], [`watchlists`], [`actors`], [`agents`], [`orgs`],
//!   [`legal_hold`], [`sessions`], [`risk_profiles`], [`audit_log`],
//!   [`trusted_activities`].
//!
//! # Quick Start
//!
//! ```ignore
//! use futures::TryStreamExt;
//! use incydr::client::IncydrClient;
//! use incydr::queries::{EventQuery, FilterBuilder};
//! use incydr::settings::{IncydrSettings, SettingsOverrides};
//!
//! let settings = IncydrSettings::load(&SettingsOverrides::default())?;
//! let client = IncydrClient::new(&settings)?;
//! let query = EventQuery::with_dates(Some("P7D".try_into()?), None)?
//!     .equals("file.category", ["Document", "SourceCode"])?;
//! let events: Vec<_> = incydr::file_events::iter_all(&client, &query)
//!     .try_collect()
//!     .await?;
//! ```

pub mod actors;
pub mod agents;
pub mod alerts;
pub mod audit_log;
pub mod auth;
pub mod bulk;
pub mod cases;
pub mod checkpoint;
pub mod cli;
pub mod client;
pub mod dates;
pub mod devices;
pub mod error;
pub mod file_events;
pub mod legal_hold;
pub mod logging;
pub mod orgs;
pub mod pagination;
pub mod queries;
pub mod retry;
pub mod risk_profiles;
pub mod sessions;
pub mod settings;
pub mod trusted_activities;
pub mod users;
pub mod watchlists;
