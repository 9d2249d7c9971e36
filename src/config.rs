use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    // When set, every API request must present this key
    pub api_key: Option<SecretString>,
    // Slack Incoming Webhook URL for deployment notifications
    pub slack_webhook_url: Option<String>,
    // Status store settings
    #[serde(default = "default_status_capacity")]
    pub status_capacity: usize,
    #[serde(default = "default_status_ttl")]
    pub status_ttl_secs: u64,
    #[serde(default = "default_prune_interval")]
    pub prune_interval_secs: u64,
    /// Multiplier for simulated build and upload waits; 0 disables them.
    #[serde(default = "default_delay_scale")]
    pub delay_scale: f64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_status_capacity() -> usize {
    1000
}

fn default_status_ttl() -> u64 {
    3600
}

fn default_prune_interval() -> u64 {
    60
}

fn default_delay_scale() -> f64 {
    1.0
}

impl Config {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions)
            && let Err(e) = dotenvy::from_filename(".env.local")
            && !e.not_found()
        {
            return Err(e).context("Failed to read .env.local");
        }

        let config = ConfigBuilder::builder()
            .add_source(File::with_name("siteploy").required(false))
            .add_source(Environment::default().separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            api_key: None,
            slack_webhook_url: None,
            status_capacity: default_status_capacity(),
            status_ttl_secs: default_status_ttl(),
            prune_interval_secs: default_prune_interval(),
            delay_scale: default_delay_scale(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_fill_missing_keys() {
        let config: Config = ConfigBuilder::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.api_key.is_none());
        assert_eq!(config.status_capacity, 1000);
        assert_eq!(config.status_ttl(), Duration::from_secs(3600));
        assert_eq!(config.delay_scale, 1.0);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: Config = ConfigBuilder::builder()
            .set_override("api_key", "s3cret")
            .unwrap()
            .set_override("delay_scale", 0.0)
            .unwrap()
            .set_override("prune_interval_secs", 0)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.api_key.as_ref().unwrap().expose_secret(), "s3cret");
        assert_eq!(config.delay_scale, 0.0);
        assert_eq!(config.prune_interval(), Duration::from_secs(1));
    }
}
