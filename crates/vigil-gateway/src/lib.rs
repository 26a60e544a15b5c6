//! HTTP boundary and outbound webhook delivery for Vigil.
//!
//! [`GatewayServer`] exposes the task submit/poll API; [`WebhookNotifier`]
//! delivers terminal task records to caller-supplied callbacks with an
//! optional HMAC-SHA256 signature.

pub mod server;
pub mod webhook;

pub use server::{AppState, GatewayServer};
pub use webhook::{sign, WebhookNotifier, SIGNATURE_HEADER};
