// Shared transport configuration for building the reqwest::Client.
//
// One long-lived client (and its connection pool) is reused for every
// request the VisionectClient makes; it is released when the client is
// dropped. Redirect following is disabled globally: a redirect would
// change the path a signature was computed over, and the login probe
// must observe the 302 itself.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;

use crate::error::Error;

/// Fixed per-request timeout applied regardless of retry state.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Transport settings for the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Accept self-signed certificates (local servers rarely have real ones).
    pub danger_accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            danger_accept_invalid_certs: false,
        }
    }
}

impl TransportConfig {
    /// Build the shared `reqwest::Client`.
    ///
    /// Always carries a cookie jar (the session-login fallback needs one)
    /// and never follows redirects.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(Policy::none())
            .cookie_provider(Arc::new(Jar::default()))
            .user_agent(concat!("joan-api/", env!("CARGO_PKG_VERSION")));

        if self.danger_accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder.build()?)
    }
}
