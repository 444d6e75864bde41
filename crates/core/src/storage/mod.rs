//! SQLite storage layer for Tessera

mod events;
mod migrations;
mod parse;
mod sales;
mod seats;
mod traits;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Event, PriceTier, SaleRecord, Seat, SeatRef};
use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;

pub use events::{EventStore, PriceTierStore};
pub use sales::SaleStore;
pub use seats::{CasOutcome, SeatCas, SeatStore};
pub use traits::{EventDirectory, InventoryStorage, SaleRepository, SeatRepository};

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Begin a transaction spanning multiple statements
    ///
    /// Stores built on the returned handle run inside the transaction;
    /// dropping it without commit rolls everything back.
    pub fn transaction(&mut self) -> Result<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Get event store
    pub fn events(&self) -> EventStore<'_> {
        EventStore::new(&self.conn)
    }

    /// Get price tier store
    pub fn price_tiers(&self) -> PriceTierStore<'_> {
        PriceTierStore::new(&self.conn)
    }

    /// Get seat ledger store
    pub fn seats(&self) -> SeatStore<'_> {
        SeatStore::new(&self.conn)
    }

    /// Get sale record store
    pub fn sales(&self) -> SaleStore<'_> {
        SaleStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl EventDirectory for Database {
    fn create_event(&self, event: &Event) -> Result<()> {
        self.events().create(event)
    }

    fn find_event_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        self.events().find_by_id(id)
    }

    fn list_events(&self) -> Result<Vec<Event>> {
        self.events().list()
    }

    fn create_price_tier(&self, tier: &PriceTier) -> Result<()> {
        self.price_tiers().create(tier)
    }

    fn find_price_tier_by_id(&self, id: Uuid) -> Result<Option<PriceTier>> {
        self.price_tiers().find_by_id(id)
    }

    fn list_price_tiers_for_event(&self, event_id: Uuid) -> Result<Vec<PriceTier>> {
        self.price_tiers().list_for_event(event_id)
    }
}

impl SeatRepository for Database {
    fn insert_seats(&self, seats: &[Seat]) -> Result<usize> {
        self.seats().insert_many(seats)
    }

    fn find_seat(&self, event_id: Uuid, row: &str, number: u32) -> Result<Option<Seat>> {
        self.seats().find(event_id, row, number)
    }

    fn list_seats_for_event(&self, event_id: Uuid) -> Result<Vec<Seat>> {
        self.seats().list_for_event(event_id)
    }

    fn list_expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Seat>> {
        self.seats().expired_holds(now)
    }

    fn seat_compare_and_set(
        &self,
        event_id: Uuid,
        seat: &SeatRef,
        cas: &SeatCas,
    ) -> Result<CasOutcome> {
        self.seats().compare_and_set(event_id, seat, cas)
    }
}

impl SaleRepository for Database {
    fn append_sale(&self, record: &SaleRecord) -> Result<()> {
        self.sales().append(record)
    }

    fn find_active_sale_for_seat(
        &self,
        event_id: Uuid,
        row: &str,
        number: u32,
    ) -> Result<Option<SaleRecord>> {
        self.sales().find_active_for_seat(event_id, row, number)
    }

    fn list_sales_for_event(&self, event_id: Uuid) -> Result<Vec<SaleRecord>> {
        self.sales().list_for_event(event_id)
    }

    fn list_sales_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<SaleRecord>> {
        self.sales().list_for_buyer(buyer_id)
    }
}
