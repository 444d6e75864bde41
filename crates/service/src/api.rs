//! Box office facade
//!
//! The typed operation surface the HTTP layer drives. Validates request
//! shapes before they reach the ledger, maps caller identities onto the
//! core components, and joins read models for clients.

use std::collections::{hash_map::Entry, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use tessera_core::{
    Database, Error, Event, EventSetup, Identity, PriceTier, PurchaseOutcome, ReservationConfig,
    ReservationManager, ReserveOutcome, Result, SeatMap, SeatMapService, SeatRef,
};

/// Most seats one batch may address
pub const MAX_BATCH_SEATS: usize = 32;

/// A batch seat operation: reserve, purchase, or release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatBatchRequest {
    pub event_id: Uuid,
    /// Processed in order; the first conflicting seat rejects the batch
    pub seats: Vec<SeatRef>,
}

impl SeatBatchRequest {
    /// Check the request shape before touching the ledger
    fn validate(&self) -> Result<()> {
        if self.seats.is_empty() {
            return Err(Error::Validation("seat list is empty".to_string()));
        }
        if self.seats.len() > MAX_BATCH_SEATS {
            return Err(Error::Validation(format!(
                "batch exceeds {MAX_BATCH_SEATS} seats"
            )));
        }

        let mut seen = HashSet::new();
        for seat in &self.seats {
            if seat.row.is_empty() || !seat.row.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(Error::Validation(format!(
                    "malformed row label {:?}",
                    seat.row
                )));
            }
            if seat.number < 1 {
                return Err(Error::Validation(format!(
                    "seat number must be 1 or greater in row {}",
                    seat.row
                )));
            }
            if !seen.insert((seat.row.clone(), seat.number)) {
                return Err(Error::Validation(format!("duplicate seat {seat}")));
            }
        }

        Ok(())
    }
}

/// Event creation request (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewEvent {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("event name is empty".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(Error::Validation("event location is empty".to_string()));
        }
        Ok(())
    }
}

/// Price tier creation request (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPriceTier {
    pub event_id: Uuid,
    pub name: String,
    pub price_cents: i64,
}

impl NewPriceTier {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("price tier name is empty".to_string()));
        }
        if self.price_cents < 0 {
            return Err(Error::Validation(
                "price_cents must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Seating chart layout request (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatingPlan {
    pub event_id: Uuid,
    pub rows: u8,
    pub seats_per_row: u32,
    pub price_tier_id: Uuid,
}

/// A purchased ticket with its event context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketView {
    pub sale_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub row: String,
    pub number: u32,
    pub barcode: String,
    pub price_cents: i64,
    pub sold_at: DateTime<Utc>,
}

/// Seat inventory operations offered to the HTTP layer
pub struct BoxOffice {
    db: Arc<Mutex<Database>>,
    reservations: Arc<ReservationManager>,
    seat_maps: SeatMapService<Database>,
    setup: EventSetup,
}

impl BoxOffice {
    pub fn new(db: Arc<Mutex<Database>>, config: ReservationConfig) -> Self {
        Self {
            reservations: Arc::new(ReservationManager::new(db.clone(), config)),
            seat_maps: SeatMapService::new(db.clone()),
            setup: EventSetup::new(db.clone()),
            db,
        }
    }

    /// Shared reservation manager, for the sweep scheduler
    pub fn reservation_manager(&self) -> Arc<ReservationManager> {
        self.reservations.clone()
    }

    /// All events, soonest first
    pub fn list_events(&self) -> Result<Vec<Event>> {
        let db = self.db.lock().unwrap();
        db.events().list()
    }

    /// One event by id
    pub fn event(&self, event_id: Uuid) -> Result<Event> {
        let db = self.db.lock().unwrap();
        db.events()
            .find_by_id(event_id)?
            .ok_or_else(|| Error::NotFound(format!("event {event_id}")))
    }

    /// The event's seat map, optionally priced
    pub fn seat_map(&self, event_id: Uuid, with_prices: bool) -> Result<SeatMap> {
        self.seat_maps.seat_map(event_id, with_prices)
    }

    /// Reserve the requested seats for the caller
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id, event_id = %request.event_id))]
    pub fn reserve(
        &self,
        identity: &Identity,
        request: &SeatBatchRequest,
    ) -> Result<ReserveOutcome> {
        request.validate()?;
        self.reservations
            .reserve(request.event_id, identity.user_id, &request.seats)
    }

    /// Convert the caller's reservations into sales
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id, event_id = %request.event_id))]
    pub fn purchase(
        &self,
        identity: &Identity,
        request: &SeatBatchRequest,
    ) -> Result<PurchaseOutcome> {
        request.validate()?;
        self.reservations
            .purchase(request.event_id, identity.user_id, &request.seats)
    }

    /// Give the caller's reservations back
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id, event_id = %request.event_id))]
    pub fn release(
        &self,
        identity: &Identity,
        request: &SeatBatchRequest,
    ) -> Result<ReserveOutcome> {
        request.validate()?;
        self.reservations
            .release(request.event_id, identity.user_id, &request.seats)
    }

    /// The caller's purchase history, most recent first
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub fn my_tickets(&self, identity: &Identity) -> Result<Vec<TicketView>> {
        let db = self.db.lock().unwrap();
        let records = db.sales().list_for_buyer(identity.user_id)?;

        let mut events: HashMap<Uuid, Event> = HashMap::new();
        let mut tickets = Vec::with_capacity(records.len());
        for record in records {
            let event = match events.entry(record.event_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let event = db.events().find_by_id(record.event_id)?.ok_or_else(|| {
                        Error::NotFound(format!(
                            "event {} for sale {}",
                            record.event_id, record.id
                        ))
                    })?;
                    entry.insert(event)
                }
            };

            tickets.push(TicketView {
                sale_id: record.id,
                event_id: record.event_id,
                event_name: event.name.clone(),
                starts_at: event.starts_at,
                location: event.location.clone(),
                row: record.row,
                number: record.number,
                barcode: record.barcode,
                price_cents: record.price_cents,
                sold_at: record.sold_at,
            });
        }

        Ok(tickets)
    }

    /// Create an event (admin only)
    pub fn create_event(&self, identity: &Identity, request: &NewEvent) -> Result<Event> {
        request.validate()?;

        let mut event = Event::new(
            request.name.trim().to_string(),
            request.starts_at,
            request.location.trim().to_string(),
        );
        if let Some(description) = &request.description {
            event = event.with_description(description.clone());
        }
        if let Some(image_url) = &request.image_url {
            event = event.with_image_url(image_url.clone());
        }

        self.setup.create_event(identity, &event)?;
        Ok(event)
    }

    /// Create a price tier (admin only)
    pub fn create_price_tier(
        &self,
        identity: &Identity,
        request: &NewPriceTier,
    ) -> Result<PriceTier> {
        request.validate()?;

        let tier = PriceTier::new(
            request.event_id,
            request.name.trim().to_string(),
            request.price_cents,
        );
        self.setup.create_price_tier(identity, &tier)?;
        Ok(tier)
    }

    /// Generate the event's seating chart (admin only)
    pub fn open_seating(&self, identity: &Identity, plan: &SeatingPlan) -> Result<usize> {
        self.setup.open_seating(
            identity,
            plan.event_id,
            plan.rows,
            plan.seats_per_row,
            plan.price_tier_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{RejectReason, SeatStatus};

    fn office() -> (BoxOffice, Uuid) {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let office = BoxOffice::new(db, ReservationConfig::default());

        let admin = Identity::admin(Uuid::new_v4());
        let event = office
            .create_event(
                &admin,
                &NewEvent {
                    name: "Winter Gala".to_string(),
                    starts_at: Utc::now() + chrono::Duration::days(30),
                    location: "Grand Hall".to_string(),
                    description: Some("Season opener".to_string()),
                    image_url: None,
                },
            )
            .unwrap();
        let tier = office
            .create_price_tier(
                &admin,
                &NewPriceTier {
                    event_id: event.id,
                    name: "Stalls".to_string(),
                    price_cents: 12500,
                },
            )
            .unwrap();
        office
            .open_seating(
                &admin,
                &SeatingPlan {
                    event_id: event.id,
                    rows: 2,
                    seats_per_row: 2,
                    price_tier_id: tier.id,
                },
            )
            .unwrap();

        (office, event.id)
    }

    fn batch(event_id: Uuid, seats: &[(&str, u32)]) -> SeatBatchRequest {
        SeatBatchRequest {
            event_id,
            seats: seats
                .iter()
                .map(|(row, number)| SeatRef::new(row.to_string(), *number))
                .collect(),
        }
    }

    #[test]
    fn test_end_to_end_sale_flow() {
        let (office, event_id) = office();
        let buyer = Identity::user(Uuid::new_v4());
        let rival = Identity::user(Uuid::new_v4());

        // Four seats open for sale
        let map = office.seat_map(event_id, false).unwrap();
        assert_eq!(map.values().flatten().count(), 4);
        assert!(map
            .values()
            .flatten()
            .all(|s| s.status == SeatStatus::Available));

        // Buyer reserves A1 and A2
        let outcome = office
            .reserve(&buyer, &batch(event_id, &[("A", 1), ("A", 2)]))
            .unwrap();
        assert_eq!(outcome, ReserveOutcome::Committed { seats: 2 });
        let map = office.seat_map(event_id, false).unwrap();
        assert!(map["A"].iter().all(|s| s.status == SeatStatus::Reserved));

        // And buys them
        let outcome = office
            .purchase(&buyer, &batch(event_id, &[("A", 1), ("A", 2)]))
            .unwrap();
        let records = match outcome {
            PurchaseOutcome::Committed { records } => records,
            other => panic!("expected committed purchase, got {other:?}"),
        };
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].barcode, records[1].barcode);

        // The seats are gone for everyone else
        let outcome = office.reserve(&rival, &batch(event_id, &[("A", 1)])).unwrap();
        assert_eq!(
            outcome,
            ReserveOutcome::Rejected {
                seat: SeatRef::new("A".to_string(), 1),
                reason: RejectReason::NotAvailable {
                    status: SeatStatus::Sold
                },
            }
        );

        // And show up in the buyer's ticket history
        let tickets = office.my_tickets(&buyer).unwrap();
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| t.event_name == "Winter Gala"));
        assert!(tickets.iter().all(|t| t.price_cents == 12500));
    }

    #[test]
    fn test_release_returns_seats() {
        let (office, event_id) = office();
        let buyer = Identity::user(Uuid::new_v4());

        office
            .reserve(&buyer, &batch(event_id, &[("B", 1)]))
            .unwrap();
        office
            .release(&buyer, &batch(event_id, &[("B", 1)]))
            .unwrap();

        let map = office.seat_map(event_id, false).unwrap();
        assert_eq!(map["B"][0].status, SeatStatus::Available);
    }

    #[test]
    fn test_batch_shape_is_validated() {
        let (office, event_id) = office();
        let buyer = Identity::user(Uuid::new_v4());

        let cases = [
            batch(event_id, &[]),
            batch(event_id, &[("A", 1), ("A", 1)]),
            batch(event_id, &[("a", 1)]),
            batch(event_id, &[("A", 0)]),
            SeatBatchRequest {
                event_id,
                seats: (1..=MAX_BATCH_SEATS as u32 + 1)
                    .map(|n| SeatRef::new("A".to_string(), n))
                    .collect(),
            },
        ];

        for request in &cases {
            let err = office.reserve(&buyer, request).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "case {request:?}");
        }

        // Nothing leaked through to the ledger
        let map = office.seat_map(event_id, false).unwrap();
        assert!(map
            .values()
            .flatten()
            .all(|s| s.status == SeatStatus::Available));
    }

    #[test]
    fn test_admin_requests_are_validated() {
        let (office, event_id) = office();
        let admin = Identity::admin(Uuid::new_v4());

        let err = office
            .create_event(
                &admin,
                &NewEvent {
                    name: "   ".to_string(),
                    starts_at: Utc::now(),
                    location: "Somewhere".to_string(),
                    description: None,
                    image_url: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = office
            .create_price_tier(
                &admin,
                &NewPriceTier {
                    event_id,
                    name: "Balcony".to_string(),
                    price_cents: -100,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_unknown_event_lookup() {
        let (office, _event_id) = office();

        assert!(matches!(
            office.event(Uuid::new_v4()).unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn test_seat_map_json_matches_client_contract() {
        let (office, event_id) = office();

        let priced = office.seat_map(event_id, true).unwrap();
        let json = serde_json::to_value(&priced).unwrap();
        assert_eq!(json["A"][0]["number"], 1);
        assert_eq!(json["A"][0]["status"], "AVAILABLE");
        assert_eq!(json["A"][0]["price_cents"], 12500);

        // Without prices the field is omitted entirely
        let bare = office.seat_map(event_id, false).unwrap();
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json["A"][0].get("price_cents").is_none());
    }
}
