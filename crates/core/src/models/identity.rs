//! Caller identity supplied by the external auth layer
//!
//! Tessera performs no credential checks itself: the surrounding service
//! verifies tokens and hands the core a user id plus an admin flag, which
//! the core trusts as-is.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A verified caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Identity {
    /// A regular user
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    /// An administrator
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Reject non-admin callers
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(Error::Unauthorized("admin claim required".to_string()))
        }
    }
}
