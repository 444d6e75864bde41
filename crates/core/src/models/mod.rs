//! Data models for Tessera

mod event;
mod hold;
mod identity;
mod price_tier;
mod sale;
mod seat;

pub use event::*;
pub use hold::*;
pub use identity::*;
pub use price_tier::*;
pub use sale::*;
pub use seat::*;
