// Rider location broadcasting: single-loop invariant across repeated
// online/offline toggles, and per-sample failure tolerance.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use suya_client::models::{GeoPoint, RiderStatus};
use suya_client::rider::{GeoError, GeoProvider, RiderApi};
use suya_client::{ClientResult, EventChannelClient, EventName, LocationBroadcaster};
use shared::events::{ChannelMessage, RiderLocationUpdate};
use tokio::sync::broadcast;

const RIDER_ID: &str = "rider-7";
const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

struct ScriptedGeo {
    calls: AtomicUsize,
    /// Fail every sample whose ordinal is in this set (1-based)
    fail_on: Vec<usize>,
}

impl ScriptedGeo {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on: vec![],
        })
    }

    fn failing_on(fail_on: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on,
        })
    }
}

#[async_trait]
impl GeoProvider for ScriptedGeo {
    async fn current_position(&self) -> Result<GeoPoint, GeoError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(GeoError::PermissionDenied);
        }
        Ok(GeoPoint {
            lat: 6.45 + call as f64 * 0.001,
            lng: 3.39,
        })
    }
}

#[derive(Default)]
struct StatusRecorder {
    statuses: Mutex<Vec<RiderStatus>>,
}

#[async_trait]
impl RiderApi for StatusRecorder {
    async fn set_status(&self, _rider_id: &str, status: RiderStatus) -> ClientResult<()> {
        self.statuses.lock().unwrap().push(status);
        Ok(())
    }
}

struct Fixture {
    broadcaster: LocationBroadcaster,
    api: Arc<StatusRecorder>,
    client_tx: broadcast::Sender<ChannelMessage>,
}

fn fixture(provider: Arc<dyn GeoProvider>) -> Fixture {
    let (server_tx, _) = broadcast::channel(256);
    let (client_tx, _) = broadcast::channel(256);
    let channel = EventChannelClient::memory(&server_tx, &client_tx);
    let api = Arc::new(StatusRecorder::default());
    let broadcaster = LocationBroadcaster::new(
        RIDER_ID,
        api.clone(),
        channel,
        provider,
        SAMPLE_INTERVAL,
    );
    Fixture {
        broadcaster,
        api,
        client_tx,
    }
}

fn count_location_events(rx: &mut broadcast::Receiver<ChannelMessage>) -> usize {
    let mut count = 0;
    while let Ok(msg) = rx.try_recv() {
        if msg.event == EventName::UpdateRiderLocation {
            count += 1;
        }
    }
    count
}

#[tokio::test]
async fn test_double_online_keeps_a_single_sampling_loop() {
    let f = fixture(ScriptedGeo::ok());
    let mut rx = f.client_tx.subscribe();

    f.broadcaster.go_online().await.unwrap();
    f.broadcaster.go_online().await.unwrap();
    assert!(f.broadcaster.is_online());

    // ~300ms window at 50ms per sample: one loop emits about 7 events
    // (immediate sample + one per tick); a leaked second loop would
    // roughly double that.
    tokio::time::sleep(Duration::from_millis(300)).await;
    f.broadcaster.go_offline().await.unwrap();

    let count = count_location_events(&mut rx);
    assert!(count >= 3, "expected steady sampling, saw {count}");
    assert!(count <= 10, "duplicate sampling loop detected: {count} events");
}

#[tokio::test]
async fn test_offline_stops_broadcasting() {
    let f = fixture(ScriptedGeo::ok());
    let mut rx = f.client_tx.subscribe();

    f.broadcaster.go_online().await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    f.broadcaster.go_offline().await.unwrap();
    assert!(!f.broadcaster.is_online());

    let _ = count_location_events(&mut rx);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(count_location_events(&mut rx), 0);

    // Status transitions reached the backend in order
    let statuses = f.api.statuses.lock().unwrap().clone();
    assert_eq!(statuses, vec![RiderStatus::Available, RiderStatus::Offline]);
}

#[tokio::test]
async fn test_offline_is_idempotent() {
    let f = fixture(ScriptedGeo::ok());
    f.broadcaster.go_offline().await.unwrap();
    f.broadcaster.go_online().await.unwrap();
    f.broadcaster.go_offline().await.unwrap();
    f.broadcaster.go_offline().await.unwrap();
    assert!(!f.broadcaster.is_online());
}

#[tokio::test]
async fn test_sample_failure_does_not_stop_the_loop() {
    // First two reads fail (permission prompt, say); later ones work
    let f = fixture(ScriptedGeo::failing_on(vec![1, 2]));
    let mut rx = f.client_tx.subscribe();

    f.broadcaster.go_online().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    f.broadcaster.go_offline().await.unwrap();

    let count = count_location_events(&mut rx);
    assert!(count >= 1, "loop must survive failed samples");
    // Two failed reads mean at least two fewer broadcasts than ticks
    assert!(count <= 8);
}

#[tokio::test]
async fn test_broadcast_payload_shape() {
    let f = fixture(ScriptedGeo::ok());
    let mut rx = f.client_tx.subscribe();

    f.broadcaster.go_online().await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    f.broadcaster.go_offline().await.unwrap();

    let msg = loop {
        let msg = rx.recv().await.unwrap();
        if msg.event == EventName::UpdateRiderLocation {
            break msg;
        }
    };
    let update: RiderLocationUpdate = msg.parse_payload().unwrap();
    assert_eq!(update.rider_id, RIDER_ID);
    assert_eq!(update.status, RiderStatus::Available);
    assert!(update.location.lat > 6.0);
}
