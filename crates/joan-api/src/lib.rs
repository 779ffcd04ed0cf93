// joan-api: Async Rust client for the Visionect device-management API.
//
// Joan e-ink tablets are managed through a Visionect server; this crate
// speaks its HTTP API: three mutually-exclusive authentication schemes
// resolved by probing, HMAC request signing, bounded retry with backoff
// for transient network failures, and the server's whole-resource
// read-modify-write update semantics.

pub mod auth;
pub mod client;
pub mod devices;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod sessions;
pub mod signature;
pub mod transport;

pub use auth::{ApiCredentials, AuthMode, LoginCredentials};
pub use client::{ClientConfig, Payload, VisionectClient};
pub use endpoint::ServerEndpoint;
pub use error::Error;
pub use models::{Backend, Device, DeviceStatus, Display, Session};
pub use transport::TransportConfig;
