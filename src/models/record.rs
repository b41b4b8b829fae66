//! Order record data models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One normalized order line, ready for loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Order identifier (e.g., "CA-2016-152156").
    pub order_id: String,
    /// Product identifier (e.g., "FUR-BO-10001798").
    pub product_id: String,
    /// Date the order was placed.
    pub order_date: NaiveDate,
    /// Date the order shipped.
    pub ship_date: NaiveDate,
    /// Customer display name.
    pub customer_name: String,
    /// Product category (e.g., "Furniture").
    pub category: String,
    /// Customer segment (e.g., "Consumer").
    pub segment: String,
    /// Sales amount.
    pub sales: f64,
    /// Units ordered.
    pub quantity: i64,
    /// Profit amount, may be negative.
    pub profit: f64,
}

impl Record {
    /// Identity key of this record.
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(&self.order_id, &self.product_id)
    }
}

/// The `(order_id, product_id)` pair identifying a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    pub order_id: String,
    pub product_id: String,
}

impl IdentityKey {
    pub fn new(order_id: &str, product_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
        }
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.order_id, self.product_id)
    }
}
