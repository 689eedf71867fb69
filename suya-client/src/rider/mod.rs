//! Rider-facing client pieces: geolocation seam and the on-duty
//! location broadcaster.

mod broadcaster;
mod geo;

pub use broadcaster::{LocationBroadcaster, RiderApi};
pub use geo::{GeoError, GeoProvider};
