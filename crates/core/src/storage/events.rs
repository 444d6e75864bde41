//! Event and price tier storage

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::{Event, PriceTier};

pub struct EventStore<'a> {
    conn: &'a Connection,
}

impl<'a> EventStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, event), fields(event_id = %event.id, name = %event.name))]
    pub fn create(&self, event: &Event) -> Result<()> {
        self.conn.execute(
            "INSERT INTO events (id, name, starts_at, location, description, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.id.to_string(),
                event.name,
                event.starts_at.to_rfc3339(),
                event.location,
                event.description,
                event.image_url,
                event.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, starts_at, location, description, image_url, created_at
             FROM events WHERE id = ?1",
        )?;

        let event = stmt
            .query_row(params![id.to_string()], row_to_event)
            .optional()?;

        Ok(event)
    }

    /// All events, soonest first
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, starts_at, location, description, image_url, created_at
             FROM events ORDER BY starts_at",
        )?;

        let events = stmt
            .query_map([], row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> std::result::Result<Event, rusqlite::Error> {
    Ok(Event {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        starts_at: parse_datetime(&row.get::<_, String>(2)?)?,
        location: row.get(3)?,
        description: row.get(4)?,
        image_url: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?)?,
    })
}

pub struct PriceTierStore<'a> {
    conn: &'a Connection,
}

impl<'a> PriceTierStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, tier), fields(tier_id = %tier.id, event_id = %tier.event_id))]
    pub fn create(&self, tier: &PriceTier) -> Result<()> {
        self.conn.execute(
            "INSERT INTO price_tiers (id, event_id, name, price_cents)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                tier.id.to_string(),
                tier.event_id.to_string(),
                tier.name,
                tier.price_cents,
            ],
        )?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<PriceTier>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_id, name, price_cents FROM price_tiers WHERE id = ?1",
        )?;

        let tier = stmt
            .query_row(params![id.to_string()], row_to_tier)
            .optional()?;

        Ok(tier)
    }

    #[instrument(skip(self))]
    pub fn list_for_event(&self, event_id: Uuid) -> Result<Vec<PriceTier>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_id, name, price_cents FROM price_tiers
             WHERE event_id = ?1 ORDER BY price_cents DESC",
        )?;

        let tiers = stmt
            .query_map(params![event_id.to_string()], row_to_tier)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tiers)
    }
}

fn row_to_tier(row: &rusqlite::Row<'_>) -> std::result::Result<PriceTier, rusqlite::Error> {
    Ok(PriceTier {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        event_id: parse_uuid(&row.get::<_, String>(1)?)?,
        name: row.get(2)?,
        price_cents: row.get(3)?,
    })
}
