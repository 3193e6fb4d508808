//! Settings for the SDK and CLI.
//!
//! Values come from four layers, highest precedence first:
//!
//! 1. Explicit overrides (CLI arguments).
//! 2. `INCYDR_*` process environment variables.
//! 3. A `.env` file in the current directory.
//! 4. A `.env` file in the user's home directory.
//!
//! `.env` files are parsed with `dotenvy::from_path_iter`, so their values
//! never leak into the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{IncydrError, Result};

/// Prefix shared by every recognised variable.
const PREFIX: &str = "INCYDR_";

pub const ENV_CLIENT_ID: &str = "INCYDR_API_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "INCYDR_API_CLIENT_SECRET";
pub const ENV_URL: &str = "INCYDR_URL";
pub const ENV_PAGE_SIZE: &str = "INCYDR_PAGE_SIZE";
pub const ENV_LOG_LEVEL: &str = "INCYDR_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "INCYDR_LOG_FILE";
pub const ENV_USE_RICH: &str = "INCYDR_USE_RICH";
pub const ENV_USER_AGENT_PREFIX: &str = "INCYDR_USER_AGENT_PREFIX";

/// Page size used when nothing is configured.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest page size any Incydr endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 10_000;

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncydrSettings {
    pub api_client_id: Option<String>,
    pub api_client_secret: Option<String>,
    /// Tenant API gateway, e.g. `https://api.us.code42.com`.
    pub url: Option<String>,
    pub page_size: usize,
    /// A `tracing` level name: `trace`, `debug`, `info`, `warn` or `error`.
    pub log_level: String,
    /// When set, logs are appended to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    /// Colored terminal output.
    pub use_rich: bool,
    pub user_agent_prefix: Option<String>,
}

impl Default for IncydrSettings {
    fn default() -> Self {
        IncydrSettings {
            api_client_id: None,
            api_client_secret: None,
            url: None,
            page_size: DEFAULT_PAGE_SIZE,
            log_level: "warn".to_string(),
            log_file: None,
            use_rich: true,
            user_agent_prefix: None,
        }
    }
}

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_client_id: Option<String>,
    pub api_client_secret: Option<String>,
    pub url: Option<String>,
    pub page_size: Option<usize>,
    pub log_level: Option<String>,
}

impl IncydrSettings {
    /// Loads settings from the process environment, `./.env` and `~/.env`.
    pub fn load(overrides: &SettingsOverrides) -> Result<Self> {
        let local = std::env::current_dir().ok().map(|dir| dir.join(".env"));
        let home = dirs::home_dir().map(|dir| dir.join(".env"));
        Self::load_from(overrides, std::env::vars(), local.as_deref(), home.as_deref())
    }

    /// Loads settings from explicit sources. `load` delegates here; tests
    /// call it directly with temporary files and a synthetic environment.
    pub fn load_from<I>(
        overrides: &SettingsOverrides,
        env: I,
        local_env_file: Option<&Path>,
        home_env_file: Option<&Path>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut values: HashMap<String, String> = HashMap::new();

        // Lowest precedence first; later layers overwrite earlier ones.
        for file in [home_env_file, local_env_file].into_iter().flatten() {
            if file.is_file() {
                values.extend(read_env_file(file)?);
            }
        }
        values.extend(env.into_iter().filter(|(key, _)| key.starts_with(PREFIX)));

        let mut settings = IncydrSettings::default();
        settings.api_client_id = values.remove(ENV_CLIENT_ID);
        settings.api_client_secret = values.remove(ENV_CLIENT_SECRET);
        settings.url = values.remove(ENV_URL);
        settings.user_agent_prefix = values.remove(ENV_USER_AGENT_PREFIX);
        settings.log_file = values.remove(ENV_LOG_FILE).map(PathBuf::from);
        if let Some(raw) = values.remove(ENV_PAGE_SIZE) {
            settings.page_size = parse_page_size(&raw)?;
        }
        if let Some(raw) = values.remove(ENV_LOG_LEVEL) {
            settings.log_level = normalize_log_level(&raw)?;
        }
        if let Some(raw) = values.remove(ENV_USE_RICH) {
            settings.use_rich = parse_bool(ENV_USE_RICH, &raw)?;
        }

        if let Some(id) = &overrides.api_client_id {
            settings.api_client_id = Some(id.clone());
        }
        if let Some(secret) = &overrides.api_client_secret {
            settings.api_client_secret = Some(secret.clone());
        }
        if let Some(url) = &overrides.url {
            settings.url = Some(url.clone());
        }
        if let Some(size) = overrides.page_size {
            settings.page_size = parse_page_size(&size.to_string())?;
        }
        if let Some(level) = &overrides.log_level {
            settings.log_level = normalize_log_level(level)?;
        }

        Ok(settings)
    }

    /// Returns `(url, client_id, client_secret)` or a `Config` error naming
    /// the first missing variable.
    pub fn require_credentials(&self) -> Result<(&str, &str, &str)> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| missing(ENV_URL))?;
        let id = self
            .api_client_id
            .as_deref()
            .ok_or_else(|| missing(ENV_CLIENT_ID))?;
        let secret = self
            .api_client_secret
            .as_deref()
            .ok_or_else(|| missing(ENV_CLIENT_SECRET))?;
        Ok((url, id, secret))
    }
}

fn missing(var: &str) -> IncydrError {
    IncydrError::Config(format!("{var} is not set"))
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let config_err = |e: dotenvy::Error| {
        IncydrError::Config(format!("failed to read {}: {e}", path.display()))
    };
    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(config_err)? {
        let (key, value) = item.map_err(config_err)?;
        if key.starts_with(PREFIX) {
            values.insert(key, value);
        }
    }
    Ok(values)
}

fn parse_page_size(raw: &str) -> Result<usize> {
    let size: usize = raw
        .trim()
        .parse()
        .map_err(|_| IncydrError::Config(format!("{ENV_PAGE_SIZE} must be a number, got '{raw}'")))?;
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(IncydrError::Config(format!(
            "{ENV_PAGE_SIZE} must be between 1 and {MAX_PAGE_SIZE}, got {size}"
        )));
    }
    Ok(size)
}

/// Accepts `tracing` level names plus the `WARNING`/`CRITICAL` spellings
/// common in existing Incydr configuration files.
fn normalize_log_level(raw: &str) -> Result<String> {
    let level = match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        other => {
            return Err(IncydrError::Config(format!(
                "{ENV_LOG_LEVEL} '{other}' is not a log level"
            )))
        }
    };
    Ok(level.to_string())
}

fn parse_bool(var: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(IncydrError::Config(format!("{var} must be true or false, got '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings =
            IncydrSettings::load_from(&SettingsOverrides::default(), vars(&[]), None, None).unwrap();
        assert_eq!(settings, IncydrSettings::default());
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn precedence_is_cli_then_env_then_local_then_home() {
        let dir = tempfile::tempdir().unwrap();
        let home = env_file(
            &dir,
            "home.env",
            "INCYDR_URL=https://home.example\nINCYDR_API_CLIENT_ID=home-id\nINCYDR_API_CLIENT_SECRET=home-secret\nINCYDR_PAGE_SIZE=10\n",
        );
        let local = env_file(
            &dir,
            "local.env",
            "INCYDR_URL=https://local.example\nINCYDR_API_CLIENT_ID=local-id\n",
        );
        let env = vars(&[("INCYDR_URL", "https://env.example"), ("PATH", "/usr/bin")]);
        let overrides = SettingsOverrides {
            url: Some("https://cli.example".into()),
            ..Default::default()
        };

        let settings =
            IncydrSettings::load_from(&overrides, env.clone(), Some(&local), Some(&home)).unwrap();
        assert_eq!(settings.url.as_deref(), Some("https://cli.example"));
        assert_eq!(settings.api_client_id.as_deref(), Some("local-id"));
        assert_eq!(settings.api_client_secret.as_deref(), Some("home-secret"));
        assert_eq!(settings.page_size, 10);

        let settings = IncydrSettings::load_from(
            &SettingsOverrides::default(),
            env,
            Some(&local),
            Some(&home),
        )
        .unwrap();
        assert_eq!(settings.url.as_deref(), Some("https://env.example"));
    }

    #[test]
    fn missing_env_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("nope.env");
        let settings = IncydrSettings::load_from(
            &SettingsOverrides::default(),
            vars(&[]),
            Some(&absent),
            Some(&absent),
        )
        .unwrap();
        assert!(settings.url.is_none());
    }

    #[test]
    fn page_size_outside_limits_is_rejected() {
        for raw in ["0", "10001", "lots"] {
            let err = IncydrSettings::load_from(
                &SettingsOverrides::default(),
                vars(&[("INCYDR_PAGE_SIZE", raw)]),
                None,
                None,
            )
            .unwrap_err();
            assert!(matches!(err, IncydrError::Config(_)), "{raw} should be rejected");
        }
    }

    #[test]
    fn log_level_and_rich_flags_are_normalized() {
        let settings = IncydrSettings::load_from(
            &SettingsOverrides::default(),
            vars(&[("INCYDR_LOG_LEVEL", "WARNING"), ("INCYDR_USE_RICH", "false")]),
            None,
            None,
        )
        .unwrap();
        assert_eq!(settings.log_level, "warn");
        assert!(!settings.use_rich);

        let err = IncydrSettings::load_from(
            &SettingsOverrides::default(),
            vars(&[("INCYDR_LOG_LEVEL", "loud")]),
            None,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn require_credentials_names_the_missing_variable() {
        let settings = IncydrSettings {
            url: Some("https://api.us.code42.com".into()),
            api_client_id: Some("key-123".into()),
            ..Default::default()
        };
        let err = settings.require_credentials().unwrap_err();
        assert!(err.to_string().contains(ENV_CLIENT_SECRET));
    }
}
