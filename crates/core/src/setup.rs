//! Event provisioning
//!
//! Admin-gated creation of events, price tiers, and the seating chart.
//! Chart generation labels rows `A`, `B`, … and numbers seats from 1, all
//! inside one transaction so a failed plan leaves no partial chart behind.

use std::sync::{Arc, Mutex};

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Event, Identity, PriceTier, Seat};
use crate::storage::{Database, EventStore, PriceTierStore, SeatStore};

/// Most rows a single chart can have; labels run A through Z
pub const MAX_ROWS: u8 = 26;

/// Most seats a single row can have
pub const MAX_SEATS_PER_ROW: u32 = 100;

pub struct EventSetup {
    db: Arc<Mutex<Database>>,
}

impl EventSetup {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Create an event (admin only)
    #[instrument(skip(self, identity, event), fields(user_id = %identity.user_id, event_id = %event.id))]
    pub fn create_event(&self, identity: &Identity, event: &Event) -> Result<()> {
        identity.require_admin()?;

        let db = self.db.lock().unwrap();
        db.events().create(event)?;
        info!(name = %event.name, "event created");
        Ok(())
    }

    /// Create a price tier for an existing event (admin only)
    #[instrument(skip(self, identity, tier), fields(user_id = %identity.user_id, tier_id = %tier.id))]
    pub fn create_price_tier(&self, identity: &Identity, tier: &PriceTier) -> Result<()> {
        identity.require_admin()?;

        let db = self.db.lock().unwrap();
        if db.events().find_by_id(tier.event_id)?.is_none() {
            return Err(Error::NotFound(format!("event {}", tier.event_id)));
        }
        db.price_tiers().create(tier)?;
        info!(
            event_id = %tier.event_id,
            name = %tier.name,
            price = %tier.format_price(),
            "price tier created"
        );
        Ok(())
    }

    /// Generate the event's seating chart (admin only)
    ///
    /// Returns the number of seats created. All seats start AVAILABLE and
    /// share the given price tier.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, event_id = %event_id))]
    pub fn open_seating(
        &self,
        identity: &Identity,
        event_id: Uuid,
        rows: u8,
        seats_per_row: u32,
        price_tier_id: Uuid,
    ) -> Result<usize> {
        identity.require_admin()?;

        if rows == 0 || rows > MAX_ROWS {
            return Err(Error::Validation(format!(
                "rows must be between 1 and {MAX_ROWS}"
            )));
        }
        if seats_per_row == 0 || seats_per_row > MAX_SEATS_PER_ROW {
            return Err(Error::Validation(format!(
                "seats_per_row must be between 1 and {MAX_SEATS_PER_ROW}"
            )));
        }

        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        let created = {
            let events = EventStore::new(&tx);
            if events.find_by_id(event_id)?.is_none() {
                return Err(Error::NotFound(format!("event {event_id}")));
            }

            let tiers = PriceTierStore::new(&tx);
            let tier = tiers
                .find_by_id(price_tier_id)?
                .ok_or_else(|| Error::NotFound(format!("price tier {price_tier_id}")))?;
            if tier.event_id != event_id {
                return Err(Error::Validation(
                    "price tier belongs to a different event".to_string(),
                ));
            }

            let mut seats = Vec::with_capacity(rows as usize * seats_per_row as usize);
            for row_label in ('A'..='Z').take(rows as usize) {
                for number in 1..=seats_per_row {
                    seats.push(Seat::new(event_id, row_label.to_string(), number, tier.id));
                }
            }
            SeatStore::new(&tx).insert_many(&seats)?
        };
        tx.commit()?;

        info!(rows, seats_per_row, created, "seating opened");
        Ok(created)
    }
}
