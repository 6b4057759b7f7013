//! Background tasks for the HTTP presentation layer

mod conversation_cleanup;

pub use conversation_cleanup::spawn_conversation_cleanup_task;
