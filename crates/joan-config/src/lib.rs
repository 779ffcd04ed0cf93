//! Shared configuration for the joanctl CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `joan_api::ClientConfig`. A profile needs a server
//! address plus at least one credential pair: an API key/secret (probed
//! as HMAC, then Basic) or a username/password (cookie login fallback).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use joan_api::{ApiCredentials, ClientConfig, LoginCredentials, TransportConfig};

/// Keyring service name for stored secrets.
pub const KEYRING_SERVICE: &str = "joanctl";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    15
}

/// A named Visionect server profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Server address (e.g. "192.168.1.50" -- port 8081 assumed).
    pub server: String,

    /// API key for HMAC / Basic auth.
    pub api_key: Option<String>,

    /// API secret (plaintext -- prefer keyring or env var).
    pub api_secret: Option<String>,

    /// Username for the cookie-login fallback.
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Accept self-signed TLS certificates.
    pub insecure: Option<bool>,

    /// Per-request timeout override, in seconds.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "joanctl", "joanctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("joanctl");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the full Config from file + `JOAN_`-prefixed environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path()))
        .merge(Env::prefixed("JOAN_").split("_"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the API secret: env var, then keyring, then plaintext config.
pub fn resolve_api_secret(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Ok(secret) = std::env::var("JOAN_API_SECRET") {
        return Some(SecretString::from(secret));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-secret")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    profile.api_secret.clone().map(SecretString::from)
}

/// Resolve the login password: env var, then keyring, then plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Ok(pw) = std::env::var("JOAN_PASSWORD") {
        return Some(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Some(SecretString::from(pw));
        }
    }

    profile.password.clone().map(SecretString::from)
}

/// Build a `joan_api::ClientConfig` from a profile.
///
/// The client probes HMAC, then Basic, then cookie login -- so both
/// credential pairs are passed through when configured. At least one
/// pair must resolve or this fails with `NoCredentials`.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ClientConfig, ConfigError> {
    if profile.server.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: "profile has no server address".into(),
        });
    }

    let api = profile.api_key.as_ref().and_then(|key| {
        resolve_api_secret(profile, profile_name).map(|secret| ApiCredentials {
            key: key.clone(),
            secret,
        })
    });

    let login = profile.username.as_ref().and_then(|username| {
        resolve_password(profile, profile_name).map(|password| LoginCredentials {
            username: username.clone(),
            password,
        })
    });

    if api.is_none() && login.is_none() {
        return Err(ConfigError::NoCredentials {
            profile: profile_name.into(),
        });
    }

    let mut transport = TransportConfig::default();
    if let Some(secs) = profile.timeout {
        transport.timeout = Duration::from_secs(secs);
    }
    transport.danger_accept_invalid_certs = profile.insecure.unwrap_or(false);

    Ok(ClientConfig {
        server: profile.server.clone(),
        api,
        login,
        transport,
    })
}
