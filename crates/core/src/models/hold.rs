//! Reservation hold - a time-bounded claim on a seat

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A hold binds a RESERVED seat to the user who reserved it until
/// `expires_at`. Destroyed by purchase, explicit release, or the expiry
/// sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    /// Create a hold for `user_id` lasting `ttl` from now
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        Self {
            user_id,
            expires_at: Utc::now() + ttl,
        }
    }

    /// Create a hold with an explicit expiry instant
    pub fn until(user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self { user_id, expires_at }
    }

    /// Whether the hold has expired as of `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_within_window() {
        let reserved_at = Utc::now();
        let hold = Hold::until(Uuid::new_v4(), reserved_at + Duration::minutes(10));

        assert!(!hold.is_expired_at(reserved_at + Duration::minutes(5)));
    }

    #[test]
    fn test_hold_past_window() {
        let reserved_at = Utc::now();
        let hold = Hold::until(Uuid::new_v4(), reserved_at + Duration::minutes(10));

        assert!(hold.is_expired_at(reserved_at + Duration::minutes(11)));
    }

    #[test]
    fn test_hold_expires_exactly_at_deadline() {
        let expires_at = Utc::now();
        let hold = Hold::until(Uuid::new_v4(), expires_at);

        assert!(hold.is_expired_at(expires_at));
    }
}
