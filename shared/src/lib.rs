//! Shared types for the Suya ordering platform
//!
//! Model types, event-channel messages and REST DTOs used by the
//! customer, admin and rider clients. This crate performs no I/O.

pub mod client;
pub mod events;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Event channel re-exports (for convenient access)
pub use events::{ChannelMessage, EventName};
