//! Hold-expiry sweeper
//!
//! Background task that periodically returns lapsed reservation holds to
//! the pool. Each pass releases per seat via the expiry-guarded
//! compare-and-set, so a purchase racing the sweep always wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tessera_core::ReservationManager;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Handle to the running sweep task
pub struct HoldSweeper {
    shutdown_tx: broadcast::Sender<()>,
}

impl HoldSweeper {
    /// Spawn the sweep loop
    pub fn start(manager: Arc<ReservationManager>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(sweep_loop(manager, interval, shutdown_rx));
        info!(interval_secs = interval.as_secs_f32(), "Hold sweeper started");

        Self { shutdown_tx }
    }

    /// Stop the sweep loop
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Hold sweeper shutdown initiated");
    }
}

async fn sweep_loop(
    manager: Arc<ReservationManager>,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                if let Err(e) = manager.release_expired_holds(Utc::now()) {
                    warn!(error = %e, "Hold sweep failed");
                }
            }
            _ = shutdown_rx.recv() => {
                debug!("Hold sweeper shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tessera_core::{
        Database, Event, Identity, PriceTier, ReservationConfig, ReserveOutcome, SeatRef,
        SeatStatus,
    };
    use uuid::Uuid;

    fn seeded_manager() -> (Arc<Mutex<Database>>, Arc<ReservationManager>, Uuid) {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let event_id = {
            let guard = db.lock().unwrap();
            let event = Event::new("Test Night".to_string(), Utc::now(), "Hall 1".to_string());
            let tier = PriceTier::new(event.id, "Middle".to_string(), 5000);
            guard.events().create(&event).unwrap();
            guard.price_tiers().create(&tier).unwrap();
            guard
                .seats()
                .insert_many(&[tessera_core::Seat::new(
                    event.id,
                    "A".to_string(),
                    1,
                    tier.id,
                )])
                .unwrap();
            event.id
        };

        // Zero TTL makes every hold expire the moment it is taken
        let config = ReservationConfig {
            hold_ttl: chrono::Duration::zero(),
        };
        let manager = Arc::new(ReservationManager::new(db.clone(), config));
        (db, manager, event_id)
    }

    fn seat_status(db: &Arc<Mutex<Database>>, event_id: Uuid) -> SeatStatus {
        db.lock()
            .unwrap()
            .seats()
            .find(event_id, "A", 1)
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn test_sweeper_releases_expired_holds() {
        let (db, manager, event_id) = seeded_manager();
        let user = Identity::user(Uuid::new_v4());

        let outcome = manager
            .reserve(event_id, user.user_id, &[SeatRef::new("A".to_string(), 1)])
            .unwrap();
        assert_eq!(outcome, ReserveOutcome::Committed { seats: 1 });
        assert_eq!(seat_status(&db, event_id), SeatStatus::Reserved);

        let sweeper = HoldSweeper::start(manager, Duration::from_millis(25));
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(seat_status(&db, event_id), SeatStatus::Available);
        sweeper.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweeping() {
        let (db, manager, event_id) = seeded_manager();

        let sweeper = HoldSweeper::start(manager.clone(), Duration::from_millis(25));
        sweeper.shutdown();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // A hold taken after shutdown stays put even past the interval
        manager
            .reserve(
                event_id,
                Uuid::new_v4(),
                &[SeatRef::new("A".to_string(), 1)],
            )
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(seat_status(&db, event_id), SeatStatus::Reserved);
    }
}
