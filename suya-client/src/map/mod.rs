//! Live Map Consumer
//!
//! Maintains the moving set of map markers: riders keyed by id,
//! location-sharing customers keyed by email. Every broadcast
//! supersedes the previous value for its key; nothing here is
//! persisted.

use dashmap::DashMap;
use std::sync::{Arc, Mutex};

use crate::channel::{EventChannelClient, Subscription};
use shared::events::{CustomerLocationUpdate, EventName, RiderLocationUpdate};
use shared::models::{GeoPoint, RiderStatus};

/// Bounding box over the visible markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl GeoBounds {
    fn of(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = GeoBounds {
            south_west: first,
            north_east: first,
        };
        for p in iter {
            bounds.south_west.lat = bounds.south_west.lat.min(p.lat);
            bounds.south_west.lng = bounds.south_west.lng.min(p.lng);
            bounds.north_east.lat = bounds.north_east.lat.max(p.lat);
            bounds.north_east.lng = bounds.north_east.lng.max(p.lng);
        }
        Some(bounds)
    }
}

/// Keyed working set of live markers.
#[derive(Debug, Default)]
pub struct LiveMapState {
    riders: DashMap<String, RiderLocationUpdate>,
    customers: DashMap<String, CustomerLocationUpdate>,
    last_fit_count: Mutex<usize>,
}

impl LiveMapState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a rider by id; the Offline sentinel removes the marker.
    pub fn apply_rider(&self, update: RiderLocationUpdate) {
        if update.status == RiderStatus::Offline {
            self.riders.remove(&update.rider_id);
        } else {
            self.riders.insert(update.rider_id.clone(), update);
        }
    }

    /// Upsert a customer by email; `is_sharing == false` removes the
    /// marker even when the payload still carries a location value.
    pub fn apply_customer(&self, update: CustomerLocationUpdate) {
        if !update.is_sharing {
            self.customers.remove(&update.email);
        } else {
            self.customers.insert(update.email.clone(), update);
        }
    }

    pub fn rider(&self, rider_id: &str) -> Option<RiderLocationUpdate> {
        self.riders.get(rider_id).map(|r| r.clone())
    }

    pub fn customer(&self, email: &str) -> Option<CustomerLocationUpdate> {
        self.customers.get(email).map(|c| c.clone())
    }

    pub fn marker_count(&self) -> usize {
        self.riders.len() + self.customers.len()
    }

    fn positions(&self) -> Vec<GeoPoint> {
        self.riders
            .iter()
            .map(|r| r.location)
            .chain(self.customers.iter().map(|c| c.location))
            .collect()
    }

    /// Bounding box of all currently visible markers.
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::of(self.positions())
    }

    /// Viewport auto-fit trigger: yields the bounding box only when
    /// the visible marker count changed since the previous call.
    pub fn fit_update(&self) -> Option<GeoBounds> {
        let count = self.marker_count();
        let mut last = self.last_fit_count.lock().expect("fit counter poisoned");
        if *last == count {
            return None;
        }
        *last = count;
        self.bounds()
    }

    /// Subscribe to the location broadcasts this consumer renders.
    /// Hold the subscriptions while the map view is mounted; dropping
    /// them on navigation releases the channel handlers.
    pub fn attach(self: Arc<Self>, channel: &EventChannelClient) -> Vec<Subscription> {
        let riders = {
            let state = self.clone();
            channel.subscribe(EventName::RiderLocationUpdated, move |msg| {
                match msg.parse_payload::<RiderLocationUpdate>() {
                    Ok(update) => state.apply_rider(update),
                    Err(e) => tracing::warn!(error = %e, "Malformed rider location"),
                }
            })
        };

        let customers = {
            let state = self.clone();
            channel.subscribe(EventName::UserLocationUpdated, move |msg| {
                match msg.parse_payload::<CustomerLocationUpdate>() {
                    Ok(update) => state.apply_customer(update),
                    Err(e) => tracing::warn!(error = %e, "Malformed customer location"),
                }
            })
        };

        vec![riders, customers]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rider(id: &str, lat: f64, lng: f64, status: RiderStatus) -> RiderLocationUpdate {
        RiderLocationUpdate {
            rider_id: id.to_string(),
            location: GeoPoint { lat, lng },
            status,
        }
    }

    fn customer(email: &str, lat: f64, lng: f64, sharing: bool) -> CustomerLocationUpdate {
        CustomerLocationUpdate {
            email: email.to_string(),
            location: GeoPoint { lat, lng },
            is_sharing: sharing,
        }
    }

    #[test]
    fn test_rider_upsert_and_offline_removal() {
        let map = LiveMapState::new();
        map.apply_rider(rider("r1", 6.45, 3.39, RiderStatus::Available));
        map.apply_rider(rider("r1", 6.50, 3.40, RiderStatus::Busy));
        assert_eq!(map.marker_count(), 1);
        assert_eq!(map.rider("r1").unwrap().location.lat, 6.50);

        map.apply_rider(rider("r1", 6.50, 3.40, RiderStatus::Offline));
        assert!(map.rider("r1").is_none());
    }

    #[test]
    fn test_sharing_disabled_removes_despite_location() {
        let map = LiveMapState::new();
        map.apply_customer(customer("ada@example.com", 6.45, 3.39, true));
        assert_eq!(map.marker_count(), 1);

        // Payload still carries a position; the sharing flag wins
        map.apply_customer(customer("ada@example.com", 6.46, 3.40, false));
        assert!(map.customer("ada@example.com").is_none());
        assert_eq!(map.marker_count(), 0);
    }

    #[test]
    fn test_bounds_cover_all_markers() {
        let map = LiveMapState::new();
        map.apply_rider(rider("r1", 6.40, 3.30, RiderStatus::Available));
        map.apply_rider(rider("r2", 6.60, 3.50, RiderStatus::Available));
        map.apply_customer(customer("ada@example.com", 6.50, 3.60, true));

        let bounds = map.bounds().unwrap();
        assert_eq!(bounds.south_west, GeoPoint { lat: 6.40, lng: 3.30 });
        assert_eq!(bounds.north_east, GeoPoint { lat: 6.60, lng: 3.60 });
    }

    #[test]
    fn test_fit_update_fires_only_on_count_change() {
        let map = LiveMapState::new();
        map.apply_rider(rider("r1", 6.40, 3.30, RiderStatus::Available));
        assert!(map.fit_update().is_some());
        assert!(map.fit_update().is_none());

        // Moving an existing marker does not refit
        map.apply_rider(rider("r1", 6.41, 3.31, RiderStatus::Available));
        assert!(map.fit_update().is_none());

        map.apply_rider(rider("r2", 6.42, 3.32, RiderStatus::Available));
        assert!(map.fit_update().is_some());
    }
}
