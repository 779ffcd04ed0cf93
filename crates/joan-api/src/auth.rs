// Authentication resolution
//
// A Visionect server accepts one of three schemes depending on version and
// deployment: HMAC request signing, HTTP Basic with the same key/secret
// pair, or a cookie session obtained by form login. The resolver probes
// them in that fixed order at construction time and the winning mode is
// pinned for the lifetime of the client -- there is no re-resolution
// mid-session.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::VisionectClient;
use crate::error::Error;

/// API key pair used by both the HMAC-signing and HTTP Basic probes.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub key: String,
    pub secret: SecretString,
}

/// Username/password pair for the cookie-session login fallback.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: SecretString,
}

/// The authentication scheme a server instance accepted.
///
/// Set exactly once by [`VisionectClient::connect`]; every subsequent
/// request uses only this mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Per-request HMAC-SHA256 signing (`Authorization: key:signature`).
    HmacSigned,
    /// Static HTTP Basic auth with the key/secret pair.
    BasicAuth,
    /// Session cookie obtained from `POST /login`.
    CookieSession,
}

impl AuthMode {
    /// Human-readable name, used in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HmacSigned => "hmac",
            Self::BasicAuth => "basic",
            Self::CookieSession => "cookie",
        }
    }
}

impl VisionectClient {
    /// Probe HMAC signing: a signed GET against the ping endpoint.
    ///
    /// Probe failure is an expected step of resolution, not an anomaly,
    /// so nothing is logged above debug level.
    pub(crate) async fn probe_hmac(&self) -> bool {
        match self
            .request_as(
                AuthMode::HmacSigned,
                reqwest::Method::GET,
                "/api/ping",
                None::<&()>,
                true,
            )
            .await
        {
            Ok(_) => {
                debug!("HMAC probe accepted");
                true
            }
            Err(e) => {
                debug!("HMAC probe rejected: {e}");
                false
            }
        }
    }

    /// Probe HTTP Basic auth with the same key/secret pair.
    pub(crate) async fn probe_basic(&self) -> bool {
        match self
            .request_as(
                AuthMode::BasicAuth,
                reqwest::Method::GET,
                "/api/ping",
                None::<&()>,
                true,
            )
            .await
        {
            Ok(_) => {
                debug!("basic auth probe accepted");
                true
            }
            Err(e) => {
                debug!("basic auth probe rejected: {e}");
                false
            }
        }
    }

    /// Probe cookie login: POST the credentials as form data.
    ///
    /// Redirects are not followed, so the raw status is visible: a login
    /// form answers 200 even on bad credentials while a real backend
    /// redirects with 302 on success. Both count as success here -- a
    /// deliberate tolerance for variance across server versions.
    pub(crate) async fn probe_login(&self, login: &LoginCredentials) -> bool {
        let url = match self.endpoint().join("/login") {
            Ok(url) => url,
            Err(e) => {
                debug!("login probe skipped: {e}");
                return false;
            }
        };

        let form = [
            ("username", login.username.as_str()),
            ("password", login.password.expose_secret()),
        ];

        match self.http().post(url).form(&form).send().await {
            Ok(resp) if resp.status() == 200 || resp.status() == 302 => {
                debug!(status = %resp.status(), "cookie login accepted");
                true
            }
            Ok(resp) => {
                debug!(status = %resp.status(), "cookie login rejected");
                false
            }
            Err(e) => {
                debug!("cookie login failed: {e}");
                false
            }
        }
    }

    /// Run the probe sequence: HMAC, then Basic, then cookie login.
    ///
    /// Returns the first mode the server accepted. Probes whose
    /// credential pair was not supplied are skipped.
    pub(crate) async fn resolve_auth(
        &self,
        has_api_pair: bool,
        login: Option<&LoginCredentials>,
    ) -> Result<AuthMode, Error> {
        if has_api_pair {
            if self.probe_hmac().await {
                return Ok(AuthMode::HmacSigned);
            }
            if self.probe_basic().await {
                return Ok(AuthMode::BasicAuth);
            }
        }

        if let Some(login) = login {
            if self.probe_login(login).await {
                return Ok(AuthMode::CookieSession);
            }
        }

        Err(Error::Authentication {
            message: format!("no accepted scheme for {}", self.endpoint()),
        })
    }
}
