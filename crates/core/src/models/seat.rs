//! Seat model and status state machine

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Hold;

/// Lifecycle status of a seat
///
/// The only legal transitions are AVAILABLE→RESERVED, RESERVED→SOLD and
/// RESERVED→AVAILABLE. SOLD is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeatStatus {
    Available,
    Reserved,
    Sold,
}

impl SeatStatus {
    /// Storage encoding, matching the legacy schema's status strings
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Reserved => "RESERVED",
            SeatStatus::Sold => "SOLD",
        }
    }

    /// Parse the storage encoding
    pub fn from_str(s: &str) -> Option<SeatStatus> {
        match s {
            "AVAILABLE" => Some(SeatStatus::Available),
            "RESERVED" => Some(SeatStatus::Reserved),
            "SOLD" => Some(SeatStatus::Sold),
            _ => None,
        }
    }

    /// Check the transition table
    pub fn can_transition_to(self, next: SeatStatus) -> bool {
        matches!(
            (self, next),
            (SeatStatus::Available, SeatStatus::Reserved)
                | (SeatStatus::Reserved, SeatStatus::Sold)
                | (SeatStatus::Reserved, SeatStatus::Available)
        )
    }

    /// SOLD never reverts
    pub fn is_terminal(self) -> bool {
        self == SeatStatus::Sold
    }
}

impl std::fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A seat in an event's seating chart
///
/// Keyed by (event_id, row, number). A seat carries a hold exactly while it
/// is RESERVED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub event_id: Uuid,
    pub row: String,
    pub number: u32,
    pub status: SeatStatus,
    pub price_tier_id: Uuid,
    pub hold: Option<Hold>,
}

impl Seat {
    pub fn new(event_id: Uuid, row: String, number: u32, price_tier_id: Uuid) -> Self {
        Self {
            event_id,
            row,
            number,
            status: SeatStatus::Available,
            price_tier_id,
            hold: None,
        }
    }

    /// Coordinates of this seat within its event
    pub fn seat_ref(&self) -> SeatRef {
        SeatRef::new(self.row.clone(), self.number)
    }
}

/// Coordinates naming one seat within an event, e.g. row "A", number 1
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatRef {
    pub row: String,
    pub number: u32,
}

impl SeatRef {
    pub fn new(row: String, number: u32) -> Self {
        Self { row, number }
    }
}

impl std::fmt::Display for SeatRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}
