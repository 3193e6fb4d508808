//! Tracing subscriber setup for the CLI.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! binary's job. `RUST_LOG` wins over `INCYDR_LOG_LEVEL` when both are set.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::settings::IncydrSettings;

/// Builds the filter: `RUST_LOG` if present and valid, else `incydr=<level>`.
pub fn env_filter(settings: &IncydrSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("incydr={}", settings.log_level)))
}

/// Installs the global subscriber. Logs go to `settings.log_file` when set,
/// otherwise to stderr so they never mix with command output on stdout.
pub fn init(settings: &IncydrSettings) -> Result<()> {
    let filter = env_filter(settings);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder
            .with_ansi(settings.use_rich)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    // A subscriber may already be installed (e.g. by an embedding program).
    if let Err(e) = installed {
        tracing::debug!("tracing subscriber already installed: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_uses_configured_level_for_crate() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let settings = IncydrSettings {
            log_level: "debug".into(),
            ..Default::default()
        };
        assert_eq!(env_filter(&settings).to_string(), "incydr=debug");
    }

    #[test]
    fn init_with_log_file_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incydr.log");
        let settings = IncydrSettings {
            log_file: Some(path.clone()),
            ..Default::default()
        };
        init(&settings).unwrap();
        assert!(path.exists());
    }
}
