//! Application services — use case implementations

pub mod bridge;
pub mod message_service;

pub use bridge::Bridge;
pub use message_service::{Classified, MessageService, MessageServiceConfig};
