//! Tessera Service Library
//!
//! Daemon shell around the inventory core: configuration, the box office
//! facade driven by the HTTP layer, first-run catalog seeding, and the
//! hold-expiry sweep.

pub mod api;
pub mod config;
pub mod error;
pub mod seed;
pub mod sweeper;

pub use api::{
    BoxOffice, NewEvent, NewPriceTier, SeatBatchRequest, SeatingPlan, TicketView, MAX_BATCH_SEATS,
};
pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use seed::SeedFile;
pub use sweeper::HoldSweeper;
