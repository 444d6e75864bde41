//! Inventory query service
//!
//! Read-side projection of the seat ledger and sale records into the
//! per-row seat map clients render. Never writes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::SeatStatus;
use crate::storage::InventoryStorage;

/// One seat as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub number: u32,
    pub status: SeatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
}

/// Row label → seats in seat-number order
///
/// BTreeMap keeps row iteration order stable for rendering.
pub type SeatMap = BTreeMap<String, Vec<SeatView>>;

/// Read-only seat map builder
///
/// Generic over the storage traits so read paths can be driven against
/// alternative backends.
pub struct SeatMapService<S> {
    storage: Arc<Mutex<S>>,
}

impl<S: InventoryStorage> SeatMapService<S> {
    pub fn new(storage: Arc<Mutex<S>>) -> Self {
        Self { storage }
    }

    /// Build the event's seat map, optionally priced
    ///
    /// All reads happen under one lock acquisition, so the map is a
    /// consistent snapshot with respect to the batch write paths.
    #[instrument(skip(self))]
    pub fn seat_map(&self, event_id: Uuid, with_prices: bool) -> Result<SeatMap> {
        let storage = self.storage.lock().unwrap();

        if storage.find_event_by_id(event_id)?.is_none() {
            return Err(Error::NotFound(format!("event {event_id}")));
        }

        let seats = storage.list_seats_for_event(event_id)?;

        let prices: HashMap<Uuid, i64> = if with_prices {
            storage
                .list_price_tiers_for_event(event_id)?
                .into_iter()
                .map(|tier| (tier.id, tier.price_cents))
                .collect()
        } else {
            HashMap::new()
        };

        let sold: HashSet<(String, u32)> = storage
            .list_sales_for_event(event_id)?
            .into_iter()
            .filter(|record| !record.is_voided())
            .map(|record| (record.row.clone(), record.number))
            .collect();

        let mut map = SeatMap::new();
        for seat in seats {
            let mut status = seat.status;
            // An active sale wins over whatever the ledger says; the
            // transactional write path cannot produce this divergence.
            if status != SeatStatus::Sold && sold.contains(&(seat.row.clone(), seat.number)) {
                warn!(
                    seat = %seat.seat_ref(),
                    ledger_status = %status,
                    "seat has an active sale but is not marked SOLD"
                );
                status = SeatStatus::Sold;
            }

            let price_cents = if with_prices {
                prices.get(&seat.price_tier_id).copied()
            } else {
                None
            };

            map.entry(seat.row.clone()).or_default().push(SeatView {
                number: seat.number,
                status,
                price_cents,
            });
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, PriceTier, SaleRecord, Seat, SeatRef};
    use crate::reservations::{ReservationConfig, ReservationManager};
    use crate::storage::Database;
    use chrono::Utc;

    fn setup() -> (Arc<Mutex<Database>>, SeatMapService<Database>, Uuid) {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let event_id = {
            let guard = db.lock().unwrap();
            let event = Event::new("Test Night".to_string(), Utc::now(), "Hall 1".to_string());
            let tier = PriceTier::new(event.id, "Middle".to_string(), 9900);
            guard.events().create(&event).unwrap();
            guard.price_tiers().create(&tier).unwrap();

            let mut seats = Vec::new();
            for row in ["A", "B"] {
                for number in 1..=2u32 {
                    seats.push(Seat::new(event.id, row.to_string(), number, tier.id));
                }
            }
            guard.seats().insert_many(&seats).unwrap();
            event.id
        };

        let service = SeatMapService::new(db.clone());
        (db, service, event_id)
    }

    #[test]
    fn test_seat_map_groups_rows_in_order() {
        let (_db, service, event_id) = setup();

        let map = service.seat_map(event_id, false).unwrap();
        let rows: Vec<&String> = map.keys().collect();
        assert_eq!(rows, vec!["A", "B"]);

        let row_a = &map["A"];
        assert_eq!(row_a.len(), 2);
        assert_eq!(row_a[0].number, 1);
        assert_eq!(row_a[1].number, 2);
        assert!(row_a.iter().all(|s| s.status == SeatStatus::Available));
        assert!(row_a.iter().all(|s| s.price_cents.is_none()));
    }

    #[test]
    fn test_seat_map_with_prices() {
        let (_db, service, event_id) = setup();

        let map = service.seat_map(event_id, true).unwrap();
        assert!(map
            .values()
            .flatten()
            .all(|s| s.price_cents == Some(9900)));
    }

    #[test]
    fn test_seat_map_reflects_lifecycle() {
        let (db, service, event_id) = setup();
        let manager = ReservationManager::new(db, ReservationConfig::default());
        let buyer = Uuid::new_v4();

        manager
            .reserve(event_id, Uuid::new_v4(), &[SeatRef::new("A".to_string(), 1)])
            .unwrap();
        manager
            .reserve(event_id, buyer, &[SeatRef::new("B".to_string(), 2)])
            .unwrap();
        manager
            .purchase(event_id, buyer, &[SeatRef::new("B".to_string(), 2)])
            .unwrap();

        let map = service.seat_map(event_id, false).unwrap();
        assert_eq!(map["A"][0].status, SeatStatus::Reserved);
        assert_eq!(map["A"][1].status, SeatStatus::Available);
        assert_eq!(map["B"][1].status, SeatStatus::Sold);
    }

    #[test]
    fn test_seat_map_unknown_event() {
        let (_db, service, _event_id) = setup();

        let err = service.seat_map(Uuid::new_v4(), false).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_active_sale_overrides_ledger_status() {
        let (db, service, event_id) = setup();

        // Write a sale record directly, leaving the ledger out of sync
        {
            let guard = db.lock().unwrap();
            let record = SaleRecord::issue(
                event_id,
                "A".to_string(),
                1,
                Uuid::new_v4(),
                9900,
                Utc::now(),
            );
            guard.sales().append(&record).unwrap();
        }

        let map = service.seat_map(event_id, false).unwrap();
        assert_eq!(map["A"][0].status, SeatStatus::Sold);
        assert_eq!(map["A"][1].status, SeatStatus::Available);
    }
}
