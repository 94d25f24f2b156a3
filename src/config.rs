use anyhow::{anyhow, bail, Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_SENSOR_ID: &str = "0";
const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

fn setup_config_path() -> Option<PathBuf> {
    env_optional("FEED_SETUP_CONFIG_PATH").map(PathBuf::from)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SetupConfigOverrides {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    sensor_id: Option<String>,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
    #[serde(default)]
    request_timeout_ms: Option<u64>,
}

fn load_setup_config_overrides() -> Option<SetupConfigOverrides> {
    let path = setup_config_path()?;
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "measurement-feed setup config not found; using env defaults"
        );
        return None;
    }
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "measurement-feed failed to read setup config; using env defaults"
            );
            return None;
        }
    };
    let mut bytes = contents.into_bytes();
    match parse_setup_overrides(&mut bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "measurement-feed failed to parse setup config; using env defaults"
            );
            None
        }
    }
}

fn parse_setup_overrides(bytes: &mut [u8]) -> simd_json::Result<SetupConfigOverrides> {
    simd_json::serde::from_slice(bytes)
}

/// Setup-file values only fill keys the environment leaves unset.
fn apply_setup_overrides(
    config: &mut Config,
    overrides: &SetupConfigOverrides,
    env_is_set: impl Fn(&str) -> bool,
) {
    if !env_is_set("FEED_BASE_URL") {
        if let Some(url) = overrides
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            config.base_url = url.to_string();
        }
    }
    if !env_is_set("FEED_SENSOR_ID") {
        if let Some(id) = overrides
            .sensor_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            config.sensor_id = id.to_string();
        }
    }
    if !env_is_set("FEED_POLL_INTERVAL_MS") {
        if let Some(value) = overrides.poll_interval_ms.filter(|v| *v != 0) {
            config.poll_interval_ms = value;
        }
    }
    if !env_is_set("FEED_REQUEST_TIMEOUT_MS") {
        if let Some(value) = overrides.request_timeout_ms.filter(|v| *v != 0) {
            config.request_timeout_ms = value;
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub sensor_id: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub otlp_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            sensor_id: DEFAULT_SENSOR_ID.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            otlp_endpoint: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let mut config = Self {
            base_url: env_string("FEED_BASE_URL", DEFAULT_BASE_URL),
            sensor_id: env_string("FEED_SENSOR_ID", DEFAULT_SENSOR_ID),
            poll_interval_ms: env_u64("FEED_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            request_timeout_ms: env_u64("FEED_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?,
            otlp_endpoint: env_optional("OTEL_EXPORTER_OTLP_ENDPOINT"),
        };

        if let Some(overrides) = load_setup_config_overrides() {
            apply_setup_overrides(&mut config, &overrides, |key| env_optional(key).is_some());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!(
                "FEED_BASE_URL must be an http(s) URL, got {:?}",
                self.base_url
            );
        }
        if self.sensor_id.trim().is_empty() || self.sensor_id.contains('/') {
            bail!("FEED_SENSOR_ID {:?} is not a valid sensor id", self.sensor_id);
        }
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("FEED_POLL_INTERVAL_MS must be greater than zero"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn env_string(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match env_optional(key) {
        Some(value) => value
            .parse::<u64>()
            .with_context(|| format!("invalid {key}")),
        None => Ok(default),
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
