//! Event model - the thing seats are sold for

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ticketed event with a seating chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(name: String, starts_at: DateTime<Utc>, location: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            starts_at,
            location,
            description: None,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_image_url(mut self, image_url: String) -> Self {
        self.image_url = Some(image_url);
        self
    }
}
