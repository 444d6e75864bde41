//! Seat ledger storage
//!
//! Authoritative store for per-seat status. `compare_and_set` is the single
//! mutation entry point for status: the guards compile into the UPDATE's
//! WHERE clause, so the check and the write are one atomic statement.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime_opt, parse_status, parse_uuid, parse_uuid_opt, OptionalExt};
use crate::error::Result;
use crate::invariants::{assert_seat_invariants, assert_transition_valid};
use crate::models::{Hold, Seat, SeatRef, SeatStatus};

/// Outcome of a compare-and-set attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// The transition was applied
    Applied,
    /// The seat exists but a guard did not match
    Conflict { actual: SeatStatus },
    /// No such seat
    NotFound,
}

/// A guarded status transition for one seat
#[derive(Debug, Clone)]
pub struct SeatCas {
    /// Status the seat must currently have
    pub expect: SeatStatus,
    /// Status to move to
    pub next: SeatStatus,
    /// Require the current hold to belong to this user
    pub expect_holder: Option<Uuid>,
    /// Require the current hold to have expired at or before this instant
    pub expect_expired_by: Option<DateTime<Utc>>,
    /// Hold written alongside the new status (None clears the hold)
    pub hold: Option<Hold>,
}

impl SeatCas {
    /// AVAILABLE → RESERVED, attaching a hold
    pub fn reserve(hold: Hold) -> Self {
        Self {
            expect: SeatStatus::Available,
            next: SeatStatus::Reserved,
            expect_holder: None,
            expect_expired_by: None,
            hold: Some(hold),
        }
    }

    /// RESERVED → SOLD, only for the seat's holder
    pub fn complete_sale(buyer_id: Uuid) -> Self {
        Self {
            expect: SeatStatus::Reserved,
            next: SeatStatus::Sold,
            expect_holder: Some(buyer_id),
            expect_expired_by: None,
            hold: None,
        }
    }

    /// RESERVED → AVAILABLE, only for the seat's holder
    pub fn release_for(user_id: Uuid) -> Self {
        Self {
            expect: SeatStatus::Reserved,
            next: SeatStatus::Available,
            expect_holder: Some(user_id),
            expect_expired_by: None,
            hold: None,
        }
    }

    /// RESERVED → AVAILABLE, only if the hold expired at or before `now`
    ///
    /// A purchase racing ahead of the sweep makes this a Conflict no-op.
    pub fn release_expired(now: DateTime<Utc>) -> Self {
        Self {
            expect: SeatStatus::Reserved,
            next: SeatStatus::Available,
            expect_holder: None,
            expect_expired_by: Some(now),
            hold: None,
        }
    }
}

pub struct SeatStore<'a> {
    conn: &'a Connection,
}

impl<'a> SeatStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert seats in bulk at event-setup time
    #[instrument(skip(self, seats), fields(count = seats.len()))]
    pub fn insert_many(&self, seats: &[Seat]) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO seats (event_id, row_name, seat_number, status, price_tier_id, held_by, held_until)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL)",
        )?;

        for seat in seats {
            stmt.execute(params![
                seat.event_id.to_string(),
                seat.row,
                seat.number,
                seat.status.as_str(),
                seat.price_tier_id.to_string(),
            ])?;
        }

        Ok(seats.len())
    }

    /// Find one seat
    #[instrument(skip(self))]
    pub fn find(&self, event_id: Uuid, row: &str, number: u32) -> Result<Option<Seat>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, row_name, seat_number, status, price_tier_id, held_by, held_until
             FROM seats WHERE event_id = ?1 AND row_name = ?2 AND seat_number = ?3",
        )?;

        let seat = stmt
            .query_row(params![event_id.to_string(), row, number], row_to_seat)
            .optional()?;

        Ok(seat)
    }

    /// List an event's seats, ordered by row then seat number
    ///
    /// The ordering is deterministic so clients can render a stable chart.
    #[instrument(skip(self))]
    pub fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Seat>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, row_name, seat_number, status, price_tier_id, held_by, held_until
             FROM seats WHERE event_id = ?1
             ORDER BY row_name, seat_number",
        )?;

        let seats = stmt
            .query_map(params![event_id.to_string()], row_to_seat)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(seats)
    }

    /// RESERVED seats whose hold expired at or before `now`, across all events
    #[instrument(skip(self))]
    pub fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Seat>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, row_name, seat_number, status, price_tier_id, held_by, held_until
             FROM seats WHERE status = 'RESERVED' AND held_until <= ?1
             ORDER BY event_id, row_name, seat_number",
        )?;

        let seats = stmt
            .query_map(params![now.to_rfc3339()], row_to_seat)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(seats)
    }

    /// Atomically transition one seat if every guard matches
    ///
    /// Returns Conflict or NotFound as values so batch callers can react
    /// per seat without unwinding.
    #[instrument(skip(self, cas), fields(seat = %seat, expect = %cas.expect, next = %cas.next))]
    pub fn compare_and_set(
        &self,
        event_id: Uuid,
        seat: &SeatRef,
        cas: &SeatCas,
    ) -> Result<CasOutcome> {
        assert_transition_valid(cas.expect, cas.next);

        let (held_by, held_until) = match &cas.hold {
            Some(h) => (Some(h.user_id.to_string()), Some(h.expires_at.to_rfc3339())),
            None => (None, None),
        };

        let affected = self.conn.execute(
            "UPDATE seats
                SET status = ?1, held_by = ?2, held_until = ?3
              WHERE event_id = ?4 AND row_name = ?5 AND seat_number = ?6
                AND status = ?7
                AND (?8 IS NULL OR held_by = ?8)
                AND (?9 IS NULL OR held_until <= ?9)",
            params![
                cas.next.as_str(),
                held_by,
                held_until,
                event_id.to_string(),
                seat.row,
                seat.number,
                cas.expect.as_str(),
                cas.expect_holder.map(|u| u.to_string()),
                cas.expect_expired_by.map(|t| t.to_rfc3339()),
            ],
        )?;

        if affected == 1 {
            return Ok(CasOutcome::Applied);
        }

        // Distinguish a missing seat from a guard mismatch
        match self.find(event_id, &seat.row, seat.number)? {
            Some(current) => Ok(CasOutcome::Conflict {
                actual: current.status,
            }),
            None => Ok(CasOutcome::NotFound),
        }
    }
}

/// Map a seats row to a Seat, assembling the hold from its two columns
fn row_to_seat(row: &rusqlite::Row<'_>) -> std::result::Result<Seat, rusqlite::Error> {
    let held_by = parse_uuid_opt(row.get::<_, Option<String>>(5)?)?;
    let held_until = parse_datetime_opt(row.get::<_, Option<String>>(6)?)?;
    let hold = match (held_by, held_until) {
        (Some(user_id), Some(expires_at)) => Some(Hold::until(user_id, expires_at)),
        _ => None,
    };

    let seat = Seat {
        event_id: parse_uuid(&row.get::<_, String>(0)?)?,
        row: row.get(1)?,
        number: row.get(2)?,
        status: parse_status(&row.get::<_, String>(3)?)?,
        price_tier_id: parse_uuid(&row.get::<_, String>(4)?)?,
        hold,
    };
    assert_seat_invariants(&seat);

    Ok(seat)
}
