// Visionect management API client
//
// Wraps `reqwest::Client` with endpoint-relative URL construction, the
// per-mode authentication mechanics, and a bounded retry loop for
// transient network failures. The device and session endpoint modules
// are implemented as inherent methods in separate files to keep this
// module focused on transport mechanics.

use chrono::Utc;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, trace};

use crate::auth::{ApiCredentials, AuthMode, LoginCredentials};
use crate::endpoint::ServerEndpoint;
use crate::error::Error;
use crate::signature;
use crate::transport::TransportConfig;

/// Total attempts per logical request (1 initial + 2 retries).
const MAX_ATTEMPTS: u32 = 3;
/// Cap on the exponential backoff delay, in seconds.
const MAX_BACKOFF_SECS: u64 = 60;

/// Everything needed to construct a [`VisionectClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Server address; normalized by [`ServerEndpoint::parse`].
    pub server: String,
    /// API key/secret pair, probed as HMAC first and Basic second.
    pub api: Option<ApiCredentials>,
    /// Username/password pair for the cookie-login fallback.
    pub login: Option<LoginCredentials>,
    pub transport: TransportConfig,
}

/// Decoded response body, classified by the server's content type.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Text(String),
}

impl Payload {
    /// Unwrap a JSON payload and deserialize it into `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, Error> {
        match self {
            Self::Json(value) => {
                serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: value.to_string(),
                })
            }
            other => Err(Error::Deserialization {
                message: "expected a JSON response".into(),
                body: format!("{other:?}"),
            }),
        }
    }
}

/// Async client for the Visionect device-management API.
///
/// Holds one shared HTTP connection pool and the authentication mode
/// resolved at construction. Concurrent calls are independent and safe
/// to issue in parallel; read-modify-write operations against the same
/// device UUID must not be raced (the server offers no compare-and-swap,
/// so the last writer wins).
pub struct VisionectClient {
    http: reqwest::Client,
    endpoint: ServerEndpoint,
    api: Option<ApiCredentials>,
    mode: AuthMode,
}

impl VisionectClient {
    /// Connect to a server: normalize the endpoint, build the transport,
    /// and resolve which authentication scheme the server accepts.
    ///
    /// Resolution runs once, here. If every probe fails the constructor
    /// returns [`Error::Authentication`] and no client exists -- there is
    /// no unauthenticated state to observe.
    pub async fn connect(config: ClientConfig) -> Result<Self, Error> {
        let endpoint = ServerEndpoint::parse(&config.server)?;
        let http = config.transport.build_client()?;

        debug!(endpoint = %endpoint, "resolving authentication mode");

        // Mode is tentative until resolution completes; probes bypass it
        // via `request_as` and `request()` is not reachable before then.
        let mut client = Self {
            http,
            endpoint,
            api: config.api,
            mode: AuthMode::HmacSigned,
        };

        let mode = client
            .resolve_auth(client.api.is_some(), config.login.as_ref())
            .await?;
        client.mode = mode;

        debug!(mode = mode.as_str(), "authentication resolved");
        Ok(client)
    }

    /// The resolved authentication mode.
    pub fn auth_mode(&self) -> AuthMode {
        self.mode
    }

    /// The normalized server endpoint.
    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    /// The underlying HTTP client (for the login probe).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Cheap reachability/credential check.
    pub async fn test_authentication(&self) -> bool {
        self.request(Method::GET, "/api/ping", None::<&()>, true)
            .await
            .is_ok()
    }

    // ── Request execution ────────────────────────────────────────────

    /// Perform one logical request with the resolved authentication mode.
    ///
    /// Connection failures and timeouts are retried up to the fixed
    /// budget with capped exponential backoff plus jitter; HTTP-level
    /// errors surface immediately. `silent` suppresses the error-level
    /// log on final failure (used while probing).
    pub(crate) async fn request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        silent: bool,
    ) -> Result<Payload, Error> {
        self.request_as(self.mode, method, path, body, silent).await
    }

    /// Like [`request`](Self::request), but with an explicit mode.
    /// Only the authentication resolver passes a mode other than the
    /// client's own.
    pub(crate) async fn request_as<B: Serialize>(
        &self,
        mode: AuthMode,
        method: Method,
        path: &str,
        body: Option<&B>,
        silent: bool,
    ) -> Result<Payload, Error> {
        // Serialize exactly once. The same bytes are hashed for the
        // signature and sent on the wire; serde_json emits compact
        // separators, which the server-side verification depends on.
        let body_bytes = match body {
            Some(value) => Some(serde_json::to_vec(value).map_err(|e| Error::Deserialization {
                message: format!("failed to serialize request body: {e}"),
                body: String::new(),
            })?),
            None => None,
        };

        let url = self.endpoint.join(path)?;

        let mut attempt = 1;
        loop {
            match self
                .send_once(mode, &method, &url, path, body_bytes.as_deref())
                .await
            {
                Ok(resp) => return self.decode(resp).await,
                Err(err) if is_retryable(&err) && attempt < MAX_ATTEMPTS => {
                    let delay = backoff_delay(attempt);
                    debug!(
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        "transient failure, backing off: {err}"
                    );
                    // Cancellable suspension: dropping the caller aborts
                    // the backoff instead of blocking shutdown.
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if is_retryable(&err) => {
                    if !silent {
                        error!("{method} {path} failed after {attempt} attempts: {err}");
                    }
                    return Err(Error::Exhausted {
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    if !silent {
                        error!("{method} {path} failed: {err}");
                    }
                    return Err(Error::Transport(err));
                }
            }
        }
    }

    /// Issue a single HTTP request with `mode`'s auth mechanics applied.
    async fn send_once(
        &self,
        mode: AuthMode,
        method: &Method,
        url: &url::Url,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        trace!(%method, %url, "sending request");

        let mut builder = self.http.request(method.clone(), url.clone());

        match mode {
            AuthMode::HmacSigned => {
                let api = self.api.as_ref().expect("HMAC mode requires an API pair");
                let date = signature::http_date(Utc::now());
                let signed =
                    signature::sign(&api.key, &api.secret, method.as_str(), path, body, &date);
                builder = builder
                    .header(reqwest::header::AUTHORIZATION, signed.authorization)
                    .header(reqwest::header::DATE, signed.date)
                    .header(reqwest::header::CONTENT_TYPE, signed.content_type);
            }
            AuthMode::BasicAuth => {
                let api = self.api.as_ref().expect("basic mode requires an API pair");
                builder = builder.basic_auth(&api.key, Some(api.secret.expose_secret()));
                if body.is_some() {
                    builder = builder
                        .header(reqwest::header::CONTENT_TYPE, signature::CONTENT_TYPE);
                }
            }
            AuthMode::CookieSession => {
                // The jar applies the session cookie by itself.
                if body.is_some() {
                    builder = builder
                        .header(reqwest::header::CONTENT_TYPE, signature::CONTENT_TYPE);
                }
            }
        }

        if let Some(bytes) = body {
            builder = builder.body(bytes.to_vec());
        }

        builder.send().await
    }

    /// Classify and decode a response.
    ///
    /// Redirects are surfaced as errors rather than followed -- for a
    /// signed request the new path would invalidate the signature.
    /// 4xx/5xx map to [`Error::Api`] and are never retried.
    async fn decode(&self, resp: reqwest::Response) -> Result<Payload, Error> {
        let status = resp.status();

        if status.is_redirection() {
            let location = resp
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            return Err(Error::RedirectBlocked {
                status: status.as_u16(),
                location,
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: truncate(&body),
            });
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();

        if content_type.starts_with("application/json") {
            let body = resp.text().await?;
            let value =
                serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: truncate(&body),
                })?;
            Ok(Payload::Json(value))
        } else if content_type.starts_with("image/") {
            Ok(Payload::Bytes(resp.bytes().await?.to_vec()))
        } else {
            Ok(Payload::Text(resp.text().await?))
        }
    }

    // ── Typed helpers used by the endpoint modules ───────────────────

    /// GET a JSON resource and deserialize it.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Method::GET, path, None::<&()>, false)
            .await?
            .into_json()
    }

    /// PUT a full resource back. Visionect has no partial updates: the
    /// entire object, unknown fields included, goes back on the wire.
    pub(crate) async fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), Error> {
        self.request(Method::PUT, path, Some(body), false).await?;
        Ok(())
    }

    /// POST with an optional JSON body, discarding the response body.
    pub(crate) async fn post<B: Serialize>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), Error> {
        self.request(Method::POST, path, body, false).await?;
        Ok(())
    }
}

/// Clip an error body to a loggable preview, respecting char boundaries.
fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Connection-refused and timeout errors are the only transient category.
fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Delay before retry `n`: `min(2^(n-1), 60)` seconds plus uniform
/// `[0, 1)` seconds of jitter.
fn backoff_delay(attempt: u32) -> std::time::Duration {
    let base = (1u64 << (attempt - 1)).min(MAX_BACKOFF_SECS);
    let jitter: f64 = rand::random();
    std::time::Duration::from_secs_f64(base as f64 + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_capped_exponential_with_jitter() {
        for _ in 0..50 {
            let first = backoff_delay(1).as_secs_f64();
            let second = backoff_delay(2).as_secs_f64();
            assert!((1.0..2.0).contains(&first), "first retry waits 1-2s, got {first}");
            assert!((2.0..3.0).contains(&second), "second retry waits 2-3s, got {second}");
        }
        // Far past the cap the base stays at 60s.
        let capped = backoff_delay(12).as_secs_f64();
        assert!((60.0..61.0).contains(&capped));
    }
}
