//! Tessera Core Library
//!
//! Seat ledger, reservation lifecycle, sale records, and storage for the
//! Tessera ticketing platform.

pub mod error;
pub mod invariants;
pub mod models;
pub mod reservations;
pub mod seatmap;
pub mod setup;
pub mod storage;

pub use error::{Error, Result};
pub use models::*;
pub use reservations::{
    PurchaseOutcome, RejectReason, ReservationConfig, ReservationManager, ReserveOutcome,
};
pub use seatmap::{SeatMap, SeatMapService, SeatView};
pub use setup::EventSetup;
pub use storage::{
    CasOutcome, Database, EventDirectory, InventoryStorage, SaleRepository, SeatCas,
    SeatRepository,
};
