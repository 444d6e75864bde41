//! Reservation manager
//!
//! Enforces the AVAILABLE → RESERVED → SOLD state machine over batches of
//! seats. Each batch runs inside one transaction under the shared database
//! mutex: the first seat that fails a guard aborts the transaction, so a
//! batch either commits for every seat or mutates nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Hold, SaleRecord, SeatRef, SeatStatus};
use crate::storage::{CasOutcome, Database, PriceTierStore, SaleStore, SeatCas, SeatStore};

/// Reservation policy knobs
#[derive(Debug, Clone)]
pub struct ReservationConfig {
    /// How long a reservation hold lasts before the sweep may reclaim it
    pub hold_ttl: Duration,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            hold_ttl: Duration::minutes(10),
        }
    }
}

/// Why a seat blocked its batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The seat is not part of the event's chart
    SeatNotFound,
    /// The seat is not in the status the operation requires
    NotAvailable { status: SeatStatus },
    /// The seat is reserved, but not by this user
    NotHeldByUser { status: SeatStatus },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::SeatNotFound => write!(f, "seat not found"),
            RejectReason::NotAvailable { status } => write!(f, "seat is {status}"),
            RejectReason::NotHeldByUser { status } => {
                write!(f, "seat is {status} and not held by this user")
            }
        }
    }
}

/// Outcome of a batch reserve or release
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Every seat in the batch transitioned
    Committed { seats: usize },
    /// The first failing seat; no seat was mutated
    Rejected { seat: SeatRef, reason: RejectReason },
}

/// Outcome of a batch purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Every seat sold; one sale record per seat
    Committed { records: Vec<SaleRecord> },
    /// The first failing seat; no seat was mutated and no record written
    Rejected { seat: SeatRef, reason: RejectReason },
}

/// Batch seat-state coordinator
///
/// Holds the shared database handle; every operation scopes its lock and
/// transaction to a single call.
pub struct ReservationManager {
    db: Arc<Mutex<Database>>,
    config: ReservationConfig,
}

impl ReservationManager {
    pub fn new(db: Arc<Mutex<Database>>, config: ReservationConfig) -> Self {
        Self { db, config }
    }

    /// Reserve every seat in the batch for `user_id`, or none of them
    ///
    /// All seats in the batch share one hold deadline.
    #[instrument(skip(self, seats), fields(event_id = %event_id, user_id = %user_id, count = seats.len()))]
    pub fn reserve(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        seats: &[SeatRef],
    ) -> Result<ReserveOutcome> {
        let hold = Hold::new(user_id, self.config.hold_ttl);

        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        let ledger = SeatStore::new(&tx);

        for seat in seats {
            let cas = SeatCas::reserve(hold.clone());
            match ledger.compare_and_set(event_id, seat, &cas)? {
                CasOutcome::Applied => {}
                CasOutcome::Conflict { actual } => {
                    debug!(seat = %seat, status = %actual, "reserve rejected");
                    return Ok(ReserveOutcome::Rejected {
                        seat: seat.clone(),
                        reason: RejectReason::NotAvailable { status: actual },
                    });
                }
                CasOutcome::NotFound => {
                    debug!(seat = %seat, "reserve rejected: unknown seat");
                    return Ok(ReserveOutcome::Rejected {
                        seat: seat.clone(),
                        reason: RejectReason::SeatNotFound,
                    });
                }
            }
        }

        tx.commit()?;
        info!(until = %hold.expires_at, "seats reserved");
        Ok(ReserveOutcome::Committed { seats: seats.len() })
    }

    /// Convert the user's reservations into sales, or change nothing
    ///
    /// The status flips and the sale records land in the same transaction,
    /// so a failure at any point leaves every seat RESERVED with no record
    /// written.
    #[instrument(skip(self, seats), fields(event_id = %event_id, user_id = %user_id, count = seats.len()))]
    pub fn purchase(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        seats: &[SeatRef],
    ) -> Result<PurchaseOutcome> {
        let sold_at = Utc::now();

        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        let ledger = SeatStore::new(&tx);
        let sales = SaleStore::new(&tx);
        let tiers = PriceTierStore::new(&tx);

        let mut tier_prices: HashMap<Uuid, i64> = HashMap::new();
        let mut records = Vec::with_capacity(seats.len());

        for seat_ref in seats {
            let seat = match ledger.find(event_id, &seat_ref.row, seat_ref.number)? {
                Some(seat) => seat,
                None => {
                    debug!(seat = %seat_ref, "purchase rejected: unknown seat");
                    return Ok(PurchaseOutcome::Rejected {
                        seat: seat_ref.clone(),
                        reason: RejectReason::SeatNotFound,
                    });
                }
            };

            let cas = SeatCas::complete_sale(user_id);
            match ledger.compare_and_set(event_id, seat_ref, &cas)? {
                CasOutcome::Applied => {}
                CasOutcome::Conflict { actual } => {
                    // A RESERVED conflict means the holder guard failed
                    let reason = if actual == SeatStatus::Reserved {
                        RejectReason::NotHeldByUser { status: actual }
                    } else {
                        RejectReason::NotAvailable { status: actual }
                    };
                    debug!(seat = %seat_ref, status = %actual, "purchase rejected");
                    return Ok(PurchaseOutcome::Rejected {
                        seat: seat_ref.clone(),
                        reason,
                    });
                }
                CasOutcome::NotFound => {
                    return Ok(PurchaseOutcome::Rejected {
                        seat: seat_ref.clone(),
                        reason: RejectReason::SeatNotFound,
                    });
                }
            }

            let price_cents = match tier_prices.get(&seat.price_tier_id) {
                Some(price) => *price,
                None => {
                    let tier = tiers.find_by_id(seat.price_tier_id)?.ok_or_else(|| {
                        crate::error::Error::NotFound(format!(
                            "price tier {} for seat {}",
                            seat.price_tier_id, seat_ref
                        ))
                    })?;
                    tier_prices.insert(tier.id, tier.price_cents);
                    tier.price_cents
                }
            };

            let record = SaleRecord::issue(
                event_id,
                seat_ref.row.clone(),
                seat_ref.number,
                user_id,
                price_cents,
                sold_at,
            );
            sales.append(&record)?;
            records.push(record);
        }

        tx.commit()?;
        info!(sales = records.len(), "purchase completed");
        Ok(PurchaseOutcome::Committed { records })
    }

    /// Give the user's reservations back, or change nothing
    #[instrument(skip(self, seats), fields(event_id = %event_id, user_id = %user_id, count = seats.len()))]
    pub fn release(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        seats: &[SeatRef],
    ) -> Result<ReserveOutcome> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        let ledger = SeatStore::new(&tx);

        for seat in seats {
            let cas = SeatCas::release_for(user_id);
            match ledger.compare_and_set(event_id, seat, &cas)? {
                CasOutcome::Applied => {}
                CasOutcome::Conflict { actual } => {
                    let reason = if actual == SeatStatus::Reserved {
                        RejectReason::NotHeldByUser { status: actual }
                    } else {
                        RejectReason::NotAvailable { status: actual }
                    };
                    debug!(seat = %seat, status = %actual, "release rejected");
                    return Ok(ReserveOutcome::Rejected {
                        seat: seat.clone(),
                        reason,
                    });
                }
                CasOutcome::NotFound => {
                    return Ok(ReserveOutcome::Rejected {
                        seat: seat.clone(),
                        reason: RejectReason::SeatNotFound,
                    });
                }
            }
        }

        tx.commit()?;
        info!("seats released");
        Ok(ReserveOutcome::Committed { seats: seats.len() })
    }

    /// Return expired holds to the pool; returns how many seats were released
    ///
    /// Scans candidates first, then releases each via its own expiry-guarded
    /// compare-and-set, so a purchase racing the sweep simply wins and the
    /// sweep skips that seat. Re-running with nothing expired releases zero.
    #[instrument(skip(self), fields(now = %now))]
    pub fn release_expired_holds(&self, now: DateTime<Utc>) -> Result<u64> {
        let candidates = {
            let db = self.db.lock().unwrap();
            db.seats().expired_holds(now)?
        };

        let mut released = 0u64;
        for seat in &candidates {
            // The scan compared RFC3339 text; confirm against the typed
            // deadline before touching the seat
            if !seat.hold.as_ref().is_some_and(|hold| hold.is_expired_at(now)) {
                continue;
            }

            let cas = SeatCas::release_expired(now);
            let outcome = {
                let db = self.db.lock().unwrap();
                db.seats().compare_and_set(seat.event_id, &seat.seat_ref(), &cas)?
            };
            if outcome == CasOutcome::Applied {
                released += 1;
            }
        }

        if released > 0 {
            info!(released, candidates = candidates.len(), "expired holds swept");
        }
        Ok(released)
    }
}
