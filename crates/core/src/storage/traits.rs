//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future network backend).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CasOutcome, SeatCas};
use crate::error::Result;
use crate::models::{Event, PriceTier, SaleRecord, Seat, SeatRef};

/// Event and price tier lookup operations
pub trait EventDirectory {
    /// Create a new event
    fn create_event(&self, event: &Event) -> Result<()>;

    /// Find event by ID
    fn find_event_by_id(&self, id: Uuid) -> Result<Option<Event>>;

    /// List all events, soonest first
    fn list_events(&self) -> Result<Vec<Event>>;

    /// Create a price tier
    fn create_price_tier(&self, tier: &PriceTier) -> Result<()>;

    /// Find price tier by ID
    fn find_price_tier_by_id(&self, id: Uuid) -> Result<Option<PriceTier>>;

    /// List an event's price tiers
    fn list_price_tiers_for_event(&self, event_id: Uuid) -> Result<Vec<PriceTier>>;
}

/// Seat ledger operations
pub trait SeatRepository {
    /// Insert seats in bulk at event-setup time
    fn insert_seats(&self, seats: &[Seat]) -> Result<usize>;

    /// Find one seat
    fn find_seat(&self, event_id: Uuid, row: &str, number: u32) -> Result<Option<Seat>>;

    /// List an event's seats, ordered by row then seat number
    fn list_seats_for_event(&self, event_id: Uuid) -> Result<Vec<Seat>>;

    /// RESERVED seats whose hold expired at or before `now`
    fn list_expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Seat>>;

    /// Atomically transition one seat if every guard matches
    fn seat_compare_and_set(
        &self,
        event_id: Uuid,
        seat: &SeatRef,
        cas: &SeatCas,
    ) -> Result<CasOutcome>;
}

/// Sale record operations
pub trait SaleRepository {
    /// Append one sale record
    fn append_sale(&self, record: &SaleRecord) -> Result<()>;

    /// The non-voided sale for a seat, if one exists
    fn find_active_sale_for_seat(
        &self,
        event_id: Uuid,
        row: &str,
        number: u32,
    ) -> Result<Option<SaleRecord>>;

    /// All sales for an event
    fn list_sales_for_event(&self, event_id: Uuid) -> Result<Vec<SaleRecord>>;

    /// A buyer's purchase history, most recent first
    fn list_sales_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<SaleRecord>>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite, mocks, or network.
pub trait InventoryStorage: EventDirectory + SeatRepository + SaleRepository {}

// Blanket implementation: any type implementing all traits implements InventoryStorage
impl<T> InventoryStorage for T where T: EventDirectory + SeatRepository + SaleRepository {}
