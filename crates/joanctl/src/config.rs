//! CLI-side configuration glue: profile selection and flag overrides.
//!
//! `joan-config` owns the TOML/figment/keyring machinery; this module
//! layers the `GlobalOpts` flags on top and produces the final
//! `joan_api::ClientConfig`.

use std::time::Duration;

use secrecy::SecretString;

use joan_api::{ApiCredentials, ClientConfig, LoginCredentials, TransportConfig};
use joan_config::{Config, Profile};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The profile name in effect: `--profile`, then the config default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the client config from profile + CLI flag overrides.
///
/// Flags win over profile values; a `--server` flag alone (plus
/// credential flags or env vars) works without any config file.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = joan_config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = cfg.profiles.get(&profile_name);
    if profile.is_none() && global.profile.is_some() && global.server.is_none() {
        return Err(CliError::ProfileNotFound { name: profile_name });
    }

    let server = global
        .server
        .clone()
        .or_else(|| profile.map(|p| p.server.clone()))
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CliError::Validation {
            field: "server".into(),
            reason: "no server address; pass --server or configure a profile".into(),
        })?;

    let api = resolve_api(global, profile, &profile_name);
    let login = resolve_login(global, profile, &profile_name);

    if api.is_none() && login.is_none() {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    }

    let insecure = global.insecure || profile.and_then(|p| p.insecure).unwrap_or(false);
    let timeout = profile
        .and_then(|p| p.timeout)
        .map_or(global.timeout, |profile_timeout| {
            // An explicit --timeout flag beats the profile value; clap
            // fills in the default otherwise, which the profile overrides.
            if global.timeout == 15 { profile_timeout } else { global.timeout }
        });

    Ok(ClientConfig {
        server,
        api,
        login,
        transport: TransportConfig {
            timeout: Duration::from_secs(timeout),
            danger_accept_invalid_certs: insecure,
        },
    })
}

fn resolve_api(
    global: &GlobalOpts,
    profile: Option<&Profile>,
    profile_name: &str,
) -> Option<ApiCredentials> {
    let key = global
        .api_key
        .clone()
        .or_else(|| profile.and_then(|p| p.api_key.clone()))?;

    let secret = global
        .api_secret
        .clone()
        .map(SecretString::from)
        .or_else(|| profile.and_then(|p| joan_config::resolve_api_secret(p, profile_name)))?;

    Some(ApiCredentials { key, secret })
}

fn resolve_login(
    global: &GlobalOpts,
    profile: Option<&Profile>,
    profile_name: &str,
) -> Option<LoginCredentials> {
    let username = global
        .username
        .clone()
        .or_else(|| profile.and_then(|p| p.username.clone()))?;

    let password = std::env::var("JOAN_PASSWORD")
        .ok()
        .map(SecretString::from)
        .or_else(|| profile.and_then(|p| joan_config::resolve_password(p, profile_name)))?;

    Some(LoginCredentials { username, password })
}
