//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the `infrastructure` and `integration_*`
//! crates implement these ports.

mod encryption_port;
mod mapping_store_port;
mod transport_port;

#[cfg(test)]
pub use encryption_port::MockEncryptionPort;
pub use encryption_port::{EncryptionPort, NoOpEncryption};
#[cfg(test)]
pub use mapping_store_port::MockMappingStorePort;
pub use mapping_store_port::MappingStorePort;
#[cfg(test)]
pub use transport_port::MockTransportClient;
pub use transport_port::{MediaPayload, SendTarget, SentMessage, TransportClient};
