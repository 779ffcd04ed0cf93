//! CLI error types with miette diagnostics.
//!
//! Maps `joan_api::Error` and `joan_config::ConfigError` into user-facing
//! errors with actionable help text and stable process exit codes.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes for scripting.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Visionect server")]
    #[diagnostic(
        code(joanctl::connection_failed),
        help(
            "Check that the server is running and accessible.\n\
             Local servers listen on port 8081 by default.\n\
             Try: joanctl ping --server <address>"
        )
    )]
    ConnectionFailed {
        #[source]
        source: joan_api::Error,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(joanctl::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout {
        #[source]
        source: joan_api::Error,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for profile '{profile}'")]
    #[diagnostic(
        code(joanctl::auth_failed),
        help(
            "The server accepted none of the configured credentials.\n\
             HMAC signing, HTTP Basic, and cookie login were all probed.\n\
             Check api_key/api_secret or username/password in your profile."
        )
    )]
    AuthFailed {
        profile: String,
        #[source]
        source: joan_api::Error,
    },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(joanctl::no_credentials),
        help(
            "Set api_key + api_secret (or username + password) in the profile,\n\
             or pass --api-key/--api-secret. Secrets can live in the keyring:\n\
             joanctl config set-secret api-secret"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Device '{uuid}' not found")]
    #[diagnostic(
        code(joanctl::not_found),
        help("Run: joanctl devices list to see known devices")
    )]
    DeviceNotFound { uuid: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server rejected the request")]
    #[diagnostic(code(joanctl::api_error))]
    Api {
        #[source]
        source: joan_api::Error,
    },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(joanctl::validation))]
    Validation { field: String, reason: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(joanctl::profile_not_found),
        help("Check `joanctl config show` for available profiles.")
    )]
    ProfileNotFound { name: String },

    #[error(transparent)]
    #[diagnostic(code(joanctl::config))]
    Config(#[from] joan_config::ConfigError),

    // ── Partial batch failure ────────────────────────────────────────
    #[error("{failed} of {total} devices failed")]
    #[diagnostic(
        code(joanctl::partial_failure),
        help("Per-device errors are listed above; successful devices were updated.")
    )]
    PartialFailure { failed: usize, total: usize },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(joanctl::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Wrap an API error from a device-scoped operation, recovering the
    /// more specific variants where the cause is recognizable.
    pub fn from_api(err: joan_api::Error, uuid: Option<&str>) -> Self {
        match &err {
            joan_api::Error::Api { status: 404, .. } => Self::DeviceNotFound {
                uuid: uuid.unwrap_or("unknown").to_owned(),
            },
            joan_api::Error::Exhausted { .. } => Self::ConnectionFailed { source: err },
            joan_api::Error::Transport(e) if e.is_timeout() => Self::Timeout { source: err },
            joan_api::Error::Transport(e) if e.is_connect() => {
                Self::ConnectionFailed { source: err }
            }
            joan_api::Error::InvalidEndpoint { input, reason } => Self::Validation {
                field: "server".into(),
                reason: format!("'{input}': {reason}"),
            },
            _ => Self::Api { source: err },
        }
    }
}

impl From<joan_api::Error> for CliError {
    fn from(err: joan_api::Error) -> Self {
        Self::from_api(err, None)
    }
}
