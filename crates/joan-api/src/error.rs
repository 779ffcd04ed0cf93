use thiserror::Error;

/// Top-level error type for the `joan-api` crate.
///
/// Covers every failure mode of the client: endpoint parsing,
/// authentication resolution, transport, the remote API, and decoding.
#[derive(Debug, Error)]
pub enum Error {
    // ── Endpoint ────────────────────────────────────────────────────
    /// The server address could not be normalized into a base URL.
    #[error("Invalid server endpoint '{input}': {reason}")]
    InvalidEndpoint { input: String, reason: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Every credential probe failed; the client was never constructed.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, ...)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Transient failures persisted through the whole retry budget.
    #[error("Request failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a redirect. Signed requests must not be
    /// re-issued against a different path, so redirects are never followed.
    #[error("Unexpected redirect (HTTP {status}) to {location:?}")]
    RedirectBlocked {
        status: u16,
        location: Option<String>,
    },

    // ── Remote API ──────────────────────────────────────────────────
    /// Non-success HTTP status from the server. Never retried.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body could not be decoded, with a preview for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The resource exists but is missing a field an operation requires
    /// (e.g. rotating a device that reports no displays).
    #[error("Device {uuid}: {message}")]
    MissingField { uuid: String, message: String },
}

impl Error {
    /// Returns `true` for errors the executor may retry: connection
    /// failures and timeouts. HTTP-level errors are semantic rejections
    /// and retrying them cannot succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            Self::Exhausted { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the server rejected the request as not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
