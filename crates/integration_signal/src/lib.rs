#![forbid(unsafe_code)]
//! Signal integration via the signal-cli REST bridge
//!
//! Client and webhook translation for a `signal-cli-rest-api`-style HTTP
//! bridge: device linking, sending text/media/reactions, polling for
//! incoming envelopes, and parsing inbound webhooks into
//! [`application::events::RawInboundEvent`].

pub mod client;
pub mod error;
pub mod types;
pub mod webhook;

pub use client::{SignalClient, SignalClientConfig};
pub use error::SignalError;
pub use types::{
    Attachment, Base64Attachment, DataMessage, Envelope, Quote, Reaction, RemoteDelete, SendRequest,
    SendResponse, SignalWebhookPayload, SyncMessage,
};
pub use webhook::{SIGNATURE_HEADER, WebhookError, verify_signature};
