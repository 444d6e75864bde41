//! Sale record storage
//!
//! Records are append-only. A partial unique index keeps at most one
//! non-voided sale per seat, so a double-sell cannot slip past the ledger
//! even under a future code defect.

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_datetime_opt, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::SaleRecord;

pub struct SaleStore<'a> {
    conn: &'a Connection,
}

impl<'a> SaleStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append one sale record
    ///
    /// Runs inside the purchase transaction; a constraint violation here
    /// aborts the whole purchase.
    #[instrument(skip(self, record), fields(sale_id = %record.id, seat = %record.seat_ref()))]
    pub fn append(&self, record: &SaleRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sale_records
                 (id, event_id, row_name, seat_number, buyer_id, barcode, price_cents, sold_at, voided_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
            params![
                record.id.to_string(),
                record.event_id.to_string(),
                record.row,
                record.number,
                record.buyer_id.to_string(),
                record.barcode,
                record.price_cents,
                record.sold_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// The non-voided sale for a seat, if one exists
    #[instrument(skip(self))]
    pub fn find_active_for_seat(
        &self,
        event_id: Uuid,
        row: &str,
        number: u32,
    ) -> Result<Option<SaleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_id, row_name, seat_number, buyer_id, barcode, price_cents, sold_at, voided_at
             FROM sale_records
             WHERE event_id = ?1 AND row_name = ?2 AND seat_number = ?3 AND voided_at IS NULL",
        )?;

        let record = stmt
            .query_row(params![event_id.to_string(), row, number], row_to_record)
            .optional()?;

        Ok(record)
    }

    #[instrument(skip(self))]
    pub fn list_for_event(&self, event_id: Uuid) -> Result<Vec<SaleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_id, row_name, seat_number, buyer_id, barcode, price_cents, sold_at, voided_at
             FROM sale_records WHERE event_id = ?1 ORDER BY sold_at",
        )?;

        let records = stmt
            .query_map(params![event_id.to_string()], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// A buyer's purchase history, most recent first
    #[instrument(skip(self))]
    pub fn list_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<SaleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_id, row_name, seat_number, buyer_id, barcode, price_cents, sold_at, voided_at
             FROM sale_records WHERE buyer_id = ?1 ORDER BY sold_at DESC",
        )?;

        let records = stmt
            .query_map(params![buyer_id.to_string()], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> std::result::Result<SaleRecord, rusqlite::Error> {
    Ok(SaleRecord {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        event_id: parse_uuid(&row.get::<_, String>(1)?)?,
        row: row.get(2)?,
        number: row.get(3)?,
        buyer_id: parse_uuid(&row.get::<_, String>(4)?)?,
        barcode: row.get(5)?,
        price_cents: row.get(6)?,
        sold_at: parse_datetime(&row.get::<_, String>(7)?)?,
        voided_at: parse_datetime_opt(row.get::<_, Option<String>>(8)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, PriceTier, Seat};
    use crate::storage::Database;
    use chrono::Utc;

    fn seeded_seat(db: &Database) -> Uuid {
        let event = Event::new("Test Night".to_string(), Utc::now(), "Hall 1".to_string());
        let tier = PriceTier::new(event.id, "Middle".to_string(), 10000);
        db.events().create(&event).unwrap();
        db.price_tiers().create(&tier).unwrap();
        db.seats()
            .insert_many(&[Seat::new(event.id, "A".to_string(), 1, tier.id)])
            .unwrap();
        event.id
    }

    #[test]
    fn test_second_active_sale_for_seat_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let event_id = seeded_seat(&db);

        let first = SaleRecord::issue(event_id, "A".to_string(), 1, Uuid::new_v4(), 10000, Utc::now());
        db.sales().append(&first).unwrap();

        let second = SaleRecord::issue(event_id, "A".to_string(), 1, Uuid::new_v4(), 10000, Utc::now());
        assert!(db.sales().append(&second).is_err());

        let active = db.sales().find_active_for_seat(event_id, "A", 1).unwrap();
        assert_eq!(active.unwrap().id, first.id);
    }
}
