// Session endpoints
//
// A device's content is driven by its session's backend. Pointing a
// device at new content means rewriting the whole session object: fetch,
// force the HTML backend, swap the URL, PUT everything back.

use serde_json::{Value, json};
use tracing::debug;

use crate::client::VisionectClient;
use crate::error::Error;
use crate::models::Session;

/// Backend type for URL-driven content.
const HTML_BACKEND: &str = "HTML";

/// Reload interval pushed alongside a new URL. Content updates are
/// pushed by re-setting the URL, so the periodic reload is effectively
/// disabled by making it a day long.
const RELOAD_TIMEOUT_SECS: &str = "86400";

impl VisionectClient {
    /// Fetch a session record.
    ///
    /// `GET /api/session/{uuid}`
    pub async fn get_session(&self, uuid: &str) -> Result<Session, Error> {
        self.get_json(&format!("/api/session/{uuid}")).await
    }

    /// Replace a full session record.
    ///
    /// `PUT /api/session/{uuid}`
    pub async fn put_session(&self, session: &Session) -> Result<(), Error> {
        self.put_json(&format!("/api/session/{}", session.uuid), session)
            .await
    }

    /// Point a device at a new URL.
    ///
    /// Fetches the current session, forces the backend type to HTML,
    /// inserts the URL and a long reload timeout, and PUTs the entire
    /// modified session back. Fail-closed: a failed fetch aborts before
    /// anything is written. Racing two writers on the same UUID can lose
    /// an update; the server offers no compare-and-swap.
    pub async fn set_device_url(&self, uuid: &str, url: &str) -> Result<(), Error> {
        let mut session = self.get_session(uuid).await?;

        session.backend.name = HTML_BACKEND.to_owned();
        session
            .backend
            .fields
            .insert("url".into(), Value::String(url.to_owned()));
        session
            .backend
            .fields
            .insert("ReloadTimeout".into(), Value::String(RELOAD_TIMEOUT_SECS.into()));

        debug!(uuid, url, "setting device URL");
        self.put_session(&session).await
    }

    /// Update the session's encoding and/or dithering options, leaving
    /// the rest of the session untouched. A `None` leaves the current
    /// value in place.
    pub async fn set_session_options(
        &self,
        uuid: &str,
        encoding: Option<&str>,
        dithering: Option<&str>,
    ) -> Result<(), Error> {
        if encoding.is_none() && dithering.is_none() {
            return Ok(());
        }

        let mut session = self.get_session(uuid).await?;

        if let Some(encoding) = encoding {
            session
                .options
                .insert("DefaultEncoding".into(), Value::String(encoding.to_owned()));
        }
        if let Some(dithering) = dithering {
            session
                .options
                .insert("DefaultDithering".into(), Value::String(dithering.to_owned()));
        }

        debug!(uuid, ?encoding, ?dithering, "setting session options");
        self.put_session(&session).await
    }

    /// Restart one device's session.
    ///
    /// `POST /api/session/{uuid}/restart`
    pub async fn restart_session(&self, uuid: &str) -> Result<(), Error> {
        debug!(uuid, "restarting session");
        self.post(&format!("/api/session/{uuid}/restart"), None::<&()>)
            .await
    }

    /// Restart many sessions in one round trip.
    ///
    /// `POST /api/session/restart` with a JSON array of UUIDs. An empty
    /// list is a success no-op; no request is made.
    pub async fn restart_sessions(&self, uuids: &[String]) -> Result<(), Error> {
        if uuids.is_empty() {
            return Ok(());
        }
        debug!(count = uuids.len(), "batch restarting sessions");
        self.post("/api/session/restart", Some(&json!(uuids))).await
    }

    /// Clear the webkit cache of many devices in one round trip.
    ///
    /// `POST /api/session/webkit-clear-cache`. Same batch rules as
    /// [`restart_sessions`](Self::restart_sessions).
    pub async fn clear_device_caches(&self, uuids: &[String]) -> Result<(), Error> {
        if uuids.is_empty() {
            return Ok(());
        }
        debug!(count = uuids.len(), "batch clearing device caches");
        self.post("/api/session/webkit-clear-cache", Some(&json!(uuids)))
            .await
    }
}
