//! Value Objects - Immutable, identity-less domain primitives

mod chat_id;
mod contact_id;
mod delivery_status;
mod media_category;
mod messenger_source;
mod phone_number;
mod session_name;

pub use chat_id::{ChatId, ChatKind};
pub use contact_id::ContactId;
pub use delivery_status::DeliveryStatus;
pub use media_category::MediaCategory;
pub use messenger_source::MessengerSource;
pub use phone_number::PhoneNumber;
pub use session_name::SessionName;
