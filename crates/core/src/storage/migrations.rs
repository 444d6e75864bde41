//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Events table
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                starts_at TEXT NOT NULL,
                location TEXT NOT NULL,
                description TEXT,
                image_url TEXT,
                created_at TEXT NOT NULL
            );

            -- Price tiers table
            CREATE TABLE IF NOT EXISTS price_tiers (
                id TEXT PRIMARY KEY,
                event_id TEXT NOT NULL,
                name TEXT NOT NULL,
                price_cents INTEGER NOT NULL,
                FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
            );

            -- Seats table, one row per (row, seat) position
            CREATE TABLE IF NOT EXISTS seats (
                event_id TEXT NOT NULL,
                row_name TEXT NOT NULL,
                seat_number INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'AVAILABLE',
                price_tier_id TEXT NOT NULL,
                PRIMARY KEY (event_id, row_name, seat_number),
                FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE,
                FOREIGN KEY (price_tier_id) REFERENCES price_tiers(id)
            );

            -- Sale records table, append-only
            CREATE TABLE IF NOT EXISTS sale_records (
                id TEXT PRIMARY KEY,
                event_id TEXT NOT NULL,
                row_name TEXT NOT NULL,
                seat_number INTEGER NOT NULL,
                buyer_id TEXT NOT NULL,
                barcode TEXT NOT NULL,
                price_cents INTEGER NOT NULL,
                sold_at TEXT NOT NULL,
                FOREIGN KEY (event_id) REFERENCES events(id)
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for catalog and sales queries",
        sql: r#"
            -- Event catalog ordering
            CREATE INDEX IF NOT EXISTS idx_events_starts ON events(starts_at);

            -- Tier lookups per event
            CREATE INDEX IF NOT EXISTS idx_price_tiers_event ON price_tiers(event_id);

            -- Sale record lookups
            CREATE INDEX IF NOT EXISTS idx_sale_records_event ON sale_records(event_id);
            CREATE INDEX IF NOT EXISTS idx_sale_records_buyer ON sale_records(buyer_id);
        "#,
    },
    Migration {
        version: 3,
        description: "Track hold owner and expiry on seats",
        sql: r#"
            -- The original layout kept only the status string, so an expiry
            -- sweep could not tell whose hold it was releasing
            ALTER TABLE seats ADD COLUMN held_by TEXT;
            ALTER TABLE seats ADD COLUMN held_until TEXT;

            -- Expiry sweep scans RESERVED seats by deadline
            CREATE INDEX IF NOT EXISTS idx_seats_held_until ON seats(status, held_until);
        "#,
    },
    Migration {
        version: 4,
        description: "Enforce one active sale per seat",
        sql: r#"
            -- Voided sales keep their row; uniqueness covers active sales only
            ALTER TABLE sale_records ADD COLUMN voided_at TEXT;

            CREATE UNIQUE INDEX IF NOT EXISTS idx_sale_records_active_seat
                ON sale_records(event_id, row_name, seat_number)
                WHERE voided_at IS NULL;
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;
    info!(current_version, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            conn.execute_batch(migration.sql)?;
            record_migration(conn, migration)?;

            info!(version = migration.version, "Migration complete");
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Get the latest migration version (test helper)
    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_migrations_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Run twice
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_sequential() {
        // Verify migrations are numbered sequentially
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version as usize,
                i + 1,
                "Migration {} should have version {}",
                migration.description,
                i + 1
            );
        }
    }
}
