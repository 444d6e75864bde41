//! First-run catalog seeding
//!
//! Provisions events, price tiers, and seating charts from a TOML file the
//! first time the service starts against an empty database. Re-running
//! against a populated catalog is a no-op.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::Identity;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::{BoxOffice, NewEvent, NewPriceTier, SeatingPlan};
use crate::error::{Error, Result};

/// Seed file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub events: Vec<SeedEvent>,
}

/// One event to provision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEvent {
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tiers: Vec<SeedTier>,
    #[serde(default)]
    pub seating: Option<SeedSeating>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedTier {
    pub name: String,
    pub price_cents: i64,
}

/// Chart layout; `tier` names the price tier the seats use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSeating {
    pub rows: u8,
    pub seats_per_row: u32,
    pub tier: String,
}

impl SeedFile {
    /// Read and parse a seed file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Apply the seed unless the catalog already has events
///
/// Returns the number of events created, zero when skipped.
#[instrument(skip(office, seed), fields(events = seed.events.len()))]
pub fn apply_if_empty(office: &BoxOffice, seed: &SeedFile) -> Result<usize> {
    if !office.list_events()?.is_empty() {
        info!("Catalog already populated, skipping seed");
        return Ok(0);
    }

    let system = Identity::admin(Uuid::new_v4());

    for entry in &seed.events {
        let event = office.create_event(
            &system,
            &NewEvent {
                name: entry.name.clone(),
                starts_at: entry.starts_at,
                location: entry.location.clone(),
                description: entry.description.clone(),
                image_url: entry.image_url.clone(),
            },
        )?;

        let mut tier_ids: HashMap<&str, Uuid> = HashMap::new();
        for tier in &entry.tiers {
            let created = office.create_price_tier(
                &system,
                &NewPriceTier {
                    event_id: event.id,
                    name: tier.name.clone(),
                    price_cents: tier.price_cents,
                },
            )?;
            tier_ids.insert(tier.name.as_str(), created.id);
        }

        if let Some(seating) = &entry.seating {
            let price_tier_id = tier_ids.get(seating.tier.as_str()).copied().ok_or_else(|| {
                Error::Seed(format!(
                    "event {:?} names unknown tier {:?}",
                    entry.name, seating.tier
                ))
            })?;
            office.open_seating(
                &system,
                &SeatingPlan {
                    event_id: event.id,
                    rows: seating.rows,
                    seats_per_row: seating.seats_per_row,
                    price_tier_id,
                },
            )?;
        }
    }

    info!(events = seed.events.len(), "Seed applied");
    Ok(seed.events.len())
}
