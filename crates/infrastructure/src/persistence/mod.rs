//! Persistence module
//!
//! SQLite-based storage for the mapping store and contact cache.

pub mod connection;
mod crypto;
pub mod mapping_store;
pub mod migrations;

pub use connection::{ConnectionPool, DatabaseError, create_pool};
pub use crypto::blind_index;
pub use mapping_store::SqliteMappingStore;
