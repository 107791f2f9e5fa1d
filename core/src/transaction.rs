use crate::types::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Merchant categories used by seeding. Imported data is not validated
/// against this list.
pub const MERCHANT_CATEGORIES: [&str; 9] = [
    "Travel & Transportation",
    "Hotels & Lodging",
    "Restaurants",
    "Office Supplies",
    "Technology & Software",
    "Professional Services",
    "Marketing & Advertising",
    "Utilities",
    "Shipping & Logistics",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub id: EntityId,
    pub customer_id: EntityId,
    pub amount: f64,
    pub merchant_category: String,
    pub is_international: bool,
    pub transaction_date: DateTime<Utc>,
    pub merchant_name: String,
}
