//! Rider Location Broadcaster
//!
//! While on duty, samples device geolocation on a fixed interval and
//! emits each sample over the event channel. The single-active-loop
//! invariant is enforced by construction: starting always cancels any
//! prior loop's token before spawning, so repeated online/offline
//! toggles can never accumulate duplicate broadcast loops.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::geo::GeoProvider;
use crate::channel::EventChannelClient;
use crate::error::ClientResult;
use crate::http::ApiClient;
use shared::events::{EventName, RiderLocationUpdate};
use shared::models::{RiderStatus, RiderUpdate};

/// Rider status update seam (backend rider endpoint).
#[async_trait]
pub trait RiderApi: Send + Sync {
    async fn set_status(&self, rider_id: &str, status: RiderStatus) -> ClientResult<()>;
}

#[async_trait]
impl RiderApi for ApiClient {
    async fn set_status(&self, rider_id: &str, status: RiderStatus) -> ClientResult<()> {
        let update = RiderUpdate {
            status: Some(status),
            ..Default::default()
        };
        self.update_rider(rider_id, &update).await?;
        Ok(())
    }
}

/// On-duty location sampling loop.
pub struct LocationBroadcaster {
    rider_id: String,
    api: Arc<dyn RiderApi>,
    channel: EventChannelClient,
    provider: Arc<dyn GeoProvider>,
    sample_interval: Duration,
    /// Token of the currently active loop, if any. Exactly one loop
    /// may be live per broadcaster.
    active: Mutex<Option<CancellationToken>>,
}

impl LocationBroadcaster {
    pub fn new(
        rider_id: impl Into<String>,
        api: Arc<dyn RiderApi>,
        channel: EventChannelClient,
        provider: Arc<dyn GeoProvider>,
        sample_interval: Duration,
    ) -> Self {
        Self {
            rider_id: rider_id.into(),
            api,
            channel,
            provider,
            sample_interval,
            active: Mutex::new(None),
        }
    }

    /// Go on duty: report Available, then start the sampling loop
    /// (immediate first sample, then one per interval).
    pub async fn go_online(&self) -> ClientResult<()> {
        self.api
            .set_status(&self.rider_id, RiderStatus::Available)
            .await?;

        let token = CancellationToken::new();
        if let Some(previous) = self
            .active
            .lock()
            .expect("broadcaster state poisoned")
            .replace(token.clone())
        {
            previous.cancel();
        }

        let rider_id = self.rider_id.clone();
        let channel = self.channel.clone();
        let provider = self.provider.clone();
        let interval = self.sample_interval;
        tokio::spawn(async move {
            sample_loop(rider_id, channel, provider, interval, token).await;
        });

        Ok(())
    }

    /// Go off duty: stop the loop (idempotent) and report Offline.
    pub async fn go_offline(&self) -> ClientResult<()> {
        if let Some(token) = self
            .active
            .lock()
            .expect("broadcaster state poisoned")
            .take()
        {
            token.cancel();
        }
        self.api
            .set_status(&self.rider_id, RiderStatus::Offline)
            .await?;
        Ok(())
    }

    pub fn is_online(&self) -> bool {
        self.active
            .lock()
            .expect("broadcaster state poisoned")
            .is_some()
    }
}

impl Drop for LocationBroadcaster {
    fn drop(&mut self) {
        // A leaked interval after teardown is a defect; the loop dies
        // with the broadcaster.
        if let Ok(mut active) = self.active.lock() {
            if let Some(token) = active.take() {
                token.cancel();
            }
        }
    }
}

async fn sample_loop(
    rider_id: String,
    channel: EventChannelClient,
    provider: Arc<dyn GeoProvider>,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                sample_once(&rider_id, &channel, provider.as_ref(), interval).await;
            }
        }
    }
    tracing::debug!(rider_id = %rider_id, "Location sampling loop stopped");
}

/// One independently time-boxed sample. Failures are logged and never
/// stop the loop.
async fn sample_once(
    rider_id: &str,
    channel: &EventChannelClient,
    provider: &dyn GeoProvider,
    time_box: Duration,
) {
    let location = match tokio::time::timeout(time_box, provider.current_position()).await {
        Ok(Ok(location)) => location,
        Ok(Err(e)) => {
            tracing::warn!(rider_id = %rider_id, error = %e, "Geolocation sample failed");
            return;
        }
        Err(_) => {
            tracing::warn!(rider_id = %rider_id, "Geolocation sample timed out");
            return;
        }
    };

    let update = RiderLocationUpdate {
        rider_id: rider_id.to_string(),
        location,
        status: RiderStatus::Available,
    };
    if let Err(e) = channel.emit(EventName::UpdateRiderLocation, &update).await {
        tracing::debug!(rider_id = %rider_id, error = %e, "Dropped location broadcast");
    }
}
