use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use shared::domain::StatusColor;

pub const DEFAULT_CONFIG_FILE: &str = "comet.toml";
pub const ENV_PREFIX: &str = "COMET";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub server_url: String,
    pub status_interval_ms: u64,
    pub resource_interval_ms: u64,
    pub chart_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Maximum records kept per collection series; unbounded when unset.
    pub chart_retention: Option<usize>,
    pub running_color: StatusColor,
    /// Cosmetic prompt shown before engaging. Not a security boundary.
    pub engage_password: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".into(),
            status_interval_ms: 500,
            resource_interval_ms: 5_000,
            chart_interval_ms: 1_000,
            request_timeout_ms: 3_000,
            chart_retention: None,
            running_color: StatusColor::Green,
            engage_password: None,
        }
    }
}

impl ClientSettings {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn resource_interval(&self) -> Duration {
        Duration::from_millis(self.resource_interval_ms)
    }

    pub fn chart_interval(&self) -> Duration {
        Duration::from_millis(self.chart_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server_url.trim().is_empty() {
            bail!("server_url must not be empty");
        }
        for (key, value) in [
            ("status_interval_ms", self.status_interval_ms),
            ("resource_interval_ms", self.resource_interval_ms),
            ("chart_interval_ms", self.chart_interval_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                bail!("{key} must be greater than zero");
            }
        }
        if self.chart_retention == Some(0) {
            bail!("chart_retention must be greater than zero when set");
        }
        Ok(())
    }
}

/// Loads settings from defaults, then `comet.toml` (or `explicit_path`), then `COMET__*` variables.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    load_settings_with_env_prefix(explicit_path, ENV_PREFIX)
}

pub(crate) fn load_settings_with_env_prefix(
    explicit_path: Option<&Path>,
    env_prefix: &str,
) -> anyhow::Result<ClientSettings> {
    let defaults = Config::try_from(&ClientSettings::default())
        .context("failed to serialize default client settings")?;

    let (path, required) = match explicit_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let settings: ClientSettings = Config::builder()
        .add_source(defaults)
        .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(required))
        .add_source(
            Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("failed to load client settings from '{}'", path.display()))?
        .try_deserialize()
        .context("invalid client settings")?;

    settings.validate()?;
    tracing::debug!(
        server_url = %settings.server_url,
        status_interval_ms = settings.status_interval_ms,
        "loaded client settings"
    );
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
