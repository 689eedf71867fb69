//! Event channel
//!
//! One persistent bidirectional connection per client session.
//! Consumers subscribe by event name and receive server pushes;
//! mutations are emitted upstream fire-and-forget. Delivery is
//! at-most-once: a message dropped during disconnection is never
//! replayed, so consumers that care about staleness re-fetch
//! authoritative state after a reconnect.

mod client;
mod transport;

pub use client::{ConnectionStatus, EventChannelClient, Subscription};
pub use transport::{MemoryTransport, TcpTransport, TlsTransport, Transport};

use thiserror::Error;

/// Event channel error type
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Connection failed or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Underlying IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame could not be decoded
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Payload (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The channel was closed
    #[error("Channel closed")]
    Closed,
}
