#![forbid(unsafe_code)]
//! WhatsApp gateway integration
//!
//! Client and webhook translation for a wwebjs-style HTTP gateway: session
//! lifecycle, contact listing, sending text/media/reactions, and parsing
//! inbound webhooks into [`application::events::RawInboundEvent`].

pub mod client;
pub mod webhook;

pub use client::{GatewayContact, SessionStatus, WhatsAppClient, WhatsAppClientConfig, WhatsAppError};
pub use webhook::{EventPayload, SIGNATURE_HEADER, WebhookError, WebhookPayload, verify_signature};
