//! Price tier model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named price level for an event's seats
///
/// Prices are integer minor-currency units (cents). A tier must not change
/// once any seat references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTier {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub price_cents: i64,
}

impl PriceTier {
    pub fn new(event_id: Uuid, name: String, price_cents: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            name,
            price_cents,
        }
    }

    /// Format the price as a decimal string, e.g. `"100.00"`
    pub fn format_price(&self) -> String {
        format!("{}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        let tier = PriceTier::new(Uuid::new_v4(), "Middle".to_string(), 10000);
        assert_eq!(tier.format_price(), "100.00");

        let tier = PriceTier::new(Uuid::new_v4(), "Cheap".to_string(), 999);
        assert_eq!(tier.format_price(), "9.99");

        let tier = PriceTier::new(Uuid::new_v4(), "Odd".to_string(), 5);
        assert_eq!(tier.format_price(), "0.05");
    }
}
