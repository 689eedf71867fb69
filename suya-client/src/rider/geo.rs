//! Device geolocation seam
//!
//! The actual geolocation API is a platform capability; the
//! broadcaster only needs one-shot position reads, so the seam is a
//! single-method trait. A denied or slow read affects that one sample
//! and nothing else.

use async_trait::async_trait;
use thiserror::Error;

use shared::models::GeoPoint;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("location request timed out")]
    Timeout,
}

/// One-shot device position reads.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn current_position(&self) -> Result<GeoPoint, GeoError>;
}
