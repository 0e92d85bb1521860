use std::fmt;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};

use crate::trajectory_client::{ClientOptions, Credentials, DEFAULT_BASE_URL};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// The env vars needed to poll an account.
#[derive(Deserialize)]
pub struct AccountEnv {
    verkeerscentrum_email: String,
    verkeerscentrum_password: String,
    #[serde(default)]
    verkeerscentrum_trajectories: Vec<String>,
    verkeerscentrum_base_url: Option<String>,
    verkeerscentrum_poll_interval_secs: Option<u64>,
    #[serde(default)]
    verkeerscentrum_accept_invalid_certs: bool,
}

pub struct AccountConfig {
    pub credentials: Credentials,
    pub trajectory_ids: Vec<String>,
    pub client_options: ClientOptions,
    pub poll_interval: Duration,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("credentials", &self.credentials)
            .field("trajectory_ids", &self.trajectory_ids)
            .field("client_options", &self.client_options)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl AccountConfig {
    pub fn new() -> anyhow::Result<Self> {
        let account_env = AccountEnv::load_from_env()?;
        Self::from_env(account_env)
    }

    pub fn from_env(account_env: AccountEnv) -> anyhow::Result<Self> {
        if account_env.verkeerscentrum_email.trim().is_empty() {
            anyhow::bail!("VERKEERSCENTRUM_EMAIL is empty");
        }
        let poll_interval_secs = account_env
            .verkeerscentrum_poll_interval_secs
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if poll_interval_secs == 0 {
            anyhow::bail!("VERKEERSCENTRUM_POLL_INTERVAL_SECS must be at least 1");
        }

        Ok(Self {
            credentials: Credentials::new(
                account_env.verkeerscentrum_email.trim(),
                account_env.verkeerscentrum_password,
            ),
            trajectory_ids: account_env
                .verkeerscentrum_trajectories
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            client_options: ClientOptions {
                base_url: account_env
                    .verkeerscentrum_base_url
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                accept_invalid_certs: account_env.verkeerscentrum_accept_invalid_certs,
            },
            poll_interval: Duration::from_secs(poll_interval_secs),
        })
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> anyhow::Result<AccountEnv> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()));
        Ok(envy::from_iter::<_, AccountEnv>(vars)?)
    }

    #[test]
    fn test_defaults() {
        let config = AccountConfig::from_env(
            env(&[
                ("VERKEERSCENTRUM_EMAIL", " jan@example.be "),
                ("VERKEERSCENTRUM_PASSWORD", "secret"),
            ])
            .unwrap(),
        )
        .unwrap();

        assert_eq!(config.credentials, Credentials::new("jan@example.be", "secret"));
        assert!(config.trajectory_ids.is_empty());
        assert_eq!(config.client_options.base_url, DEFAULT_BASE_URL);
        assert!(!config.client_options.accept_invalid_certs);
        assert_eq!(config.poll_interval, Duration::from_secs(300));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_overrides() {
        let config = AccountConfig::from_env(
            env(&[
                ("VERKEERSCENTRUM_EMAIL", "jan@example.be"),
                ("VERKEERSCENTRUM_PASSWORD", "secret"),
                ("VERKEERSCENTRUM_TRAJECTORIES", "12, 34,,56"),
                ("VERKEERSCENTRUM_BASE_URL", "http://127.0.0.1:8080"),
                ("VERKEERSCENTRUM_POLL_INTERVAL_SECS", "60"),
                ("VERKEERSCENTRUM_ACCEPT_INVALID_CERTS", "true"),
            ])
            .unwrap(),
        )
        .unwrap();

        assert_eq!(config.trajectory_ids, vec!["12", "34", "56"]);
        assert_eq!(config.client_options.base_url, "http://127.0.0.1:8080");
        assert!(config.client_options.accept_invalid_certs);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_password_is_an_error() {
        assert!(env(&[("VERKEERSCENTRUM_EMAIL", "jan@example.be")]).is_err());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let account_env = env(&[
            ("VERKEERSCENTRUM_EMAIL", "jan@example.be"),
            ("VERKEERSCENTRUM_PASSWORD", "secret"),
            ("VERKEERSCENTRUM_POLL_INTERVAL_SECS", "0"),
        ])
        .unwrap();
        assert!(AccountConfig::from_env(account_env).is_err());
    }
}
