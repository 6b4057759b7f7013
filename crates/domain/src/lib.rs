//! Domain layer for WhatSignal
//!
//! Contains core business logic, entities, value objects, and domain errors.
//! This layer has no external dependencies and defines the ubiquitous
//! language for the WhatsApp <-> Signal relay.

pub mod entities;
pub mod errors;
pub mod logging;
pub mod media_router;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use logging::mask_tail;
pub use media_router::MediaRouter;
pub use value_objects::*;
