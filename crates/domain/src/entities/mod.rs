//! Domain entities - Objects with identity and lifecycle

mod channel;
mod contact;
mod message_mapping;

pub use channel::Channel;
pub use contact::Contact;
pub use message_mapping::MessageMapping;
