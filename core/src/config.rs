//! Client configuration loaded from the environment.
//!
//! | variable | meaning |
//! |---|---|
//! | `GOCD_SERVER_URL` | base address including `/go` (required) |
//! | `GOCD_ACCESS_TOKEN` | bearer token; wins over basic credentials |
//! | `GOCD_USERNAME` / `GOCD_PASSWORD` | basic credentials |
//! | `GOCD_DEBUG` | `true`/`1` enables debug diagnostics |
//! | `GOCD_TIMEOUT_SECS` | overall per-call timeout, default 60 |

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::auth::Auth;
use crate::client::GocdClient;
use crate::error::TransportError;
use crate::transport::{Transport, DEFAULT_TIMEOUT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Everything needed to build a `GocdClient`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.is_empty());

        let server_url = get("GOCD_SERVER_URL").ok_or(ConfigError::Missing("GOCD_SERVER_URL"))?;

        let debug = match get("GOCD_DEBUG") {
            None => false,
            Some(value) => parse_flag(&value).ok_or(ConfigError::Invalid {
                var: "GOCD_DEBUG",
                value,
            })?,
        };

        let timeout_secs = match get("GOCD_TIMEOUT_SECS") {
            None => None,
            Some(value) => Some(value.parse().map_err(|_| ConfigError::Invalid {
                var: "GOCD_TIMEOUT_SECS",
                value,
            })?),
        };

        Ok(Self {
            server_url,
            access_token: get("GOCD_ACCESS_TOKEN"),
            username: get("GOCD_USERNAME"),
            password: get("GOCD_PASSWORD"),
            debug,
            timeout_secs,
        })
    }

    /// Strategy implied by the configured secrets. A token wins over basic
    /// credentials; a username without a password uses an empty password.
    pub fn auth(&self) -> Auth {
        match (&self.access_token, &self.username) {
            (Some(token), _) => Auth::bearer(token.clone()),
            (None, Some(username)) => {
                Auth::basic(username.clone(), self.password.clone().unwrap_or_default())
            }
            (None, None) => Auth::None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn connect(&self) -> Result<GocdClient, ConfigError> {
        let transport = Transport::builder(&self.server_url)
            .timeout(self.timeout())
            .auth(self.auth())
            .debug(self.debug)
            .build()?;
        Ok(GocdClient::from_transport(transport))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
