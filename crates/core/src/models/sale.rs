//! Sale record model and barcode derivation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable proof that a seat was sold to a user
///
/// Append-only: once written, a record is never edited. `voided_at` exists
/// in the schema for future refund support but nothing sets it today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: Uuid,
    pub event_id: Uuid,
    pub row: String,
    pub number: u32,
    pub buyer_id: Uuid,
    pub barcode: String,
    pub price_cents: i64,
    pub sold_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
}

impl SaleRecord {
    /// Build the record for a completed sale, deriving its barcode
    pub fn issue(
        event_id: Uuid,
        row: String,
        number: u32,
        buyer_id: Uuid,
        price_cents: i64,
        sold_at: DateTime<Utc>,
    ) -> Self {
        let barcode = derive_barcode(event_id, &row, number);
        Self {
            id: Uuid::new_v4(),
            event_id,
            row,
            number,
            buyer_id,
            barcode,
            price_cents,
            sold_at,
            voided_at: None,
        }
    }

    pub fn is_voided(&self) -> bool {
        self.voided_at.is_some()
    }

    /// Coordinates of the sold seat
    pub fn seat_ref(&self) -> super::SeatRef {
        super::SeatRef::new(self.row.clone(), self.number)
    }
}

/// Derive the barcode for a seat (legacy format)
///
/// Deterministic over (event_id, row, number): anyone who knows the seat can
/// recompute it, so a barcode must never be treated as proof of ownership.
pub fn derive_barcode(event_id: Uuid, row: &str, number: u32) -> String {
    let payload = format!("{}:{}:{}", event_id, row, number);
    URL_SAFE_NO_PAD.encode(payload.as_bytes())
}
