//! Suya Client - state-synchronization SDK for the ordering platform
//!
//! The backend owns orders, payments, promo rules and rider
//! assignment; this crate is the client half: optimistic local state
//! (cart, profile, order history), a persistent event-channel
//! subscription that reconciles server pushes into that state without
//! clobbering user intent, and the order-lifecycle and live-location
//! machinery the customer, admin and rider surfaces render from.

pub mod channel;
pub mod checkout;
pub mod config;
pub mod error;
pub mod http;
pub mod map;
pub mod rider;
pub mod state;
pub mod store;
pub mod tracking;

pub use channel::{ChannelError, ConnectionStatus, EventChannelClient, Subscription};
pub use checkout::{CheckoutError, CheckoutFlow, PaymentBackend};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use map::LiveMapState;
pub use rider::{GeoError, GeoProvider, LocationBroadcaster, RiderApi};
pub use state::{CartManager, IdentityManager, PromoOutcome, PromoValidator, SessionIdentity};
pub use store::{LocalStore, StoreError};

// Re-export shared types for convenience
pub use shared::events::{ChannelMessage, EventName};
pub use shared::models;
