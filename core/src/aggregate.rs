//! Feature aggregation: per-customer statistics over raw transactions.
//!
//! Pure functions only. The pipeline fetches each customer's transactions
//! and calls `aggregate` once per customer before clustering.

use crate::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionStats {
    pub total_transactions: u64,
    /// Arithmetic mean of amounts; 0.0 when there are no transactions.
    pub avg_transaction_value: f64,
    /// Most frequent merchant category; empty when there are no transactions.
    pub top_merchant_category: String,
}

/// Summarize one customer's transactions.
///
/// Ties on the top category resolve to the lexicographically smallest
/// category name, so the result never depends on fetch order.
pub fn aggregate(transactions: &[TransactionRecord]) -> TransactionStats {
    if transactions.is_empty() {
        return TransactionStats::default();
    }

    let total = transactions.len();
    let sum: f64 = transactions.iter().map(|t| t.amount).sum();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for t in transactions {
        *counts.entry(t.merchant_category.as_str()).or_insert(0) += 1;
    }
    // BTreeMap iterates in key order; strict `>` keeps the first (smallest) key on ties.
    let mut top: Option<(&str, usize)> = None;
    for (category, count) in counts {
        match top {
            Some((_, best)) if count <= best => {}
            _ => top = Some((category, count)),
        }
    }

    TransactionStats {
        total_transactions: total as u64,
        avg_transaction_value: sum / total as f64,
        top_merchant_category: top.map(|(c, _)| c.to_string()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn txn(amount: f64, category: &str) -> TransactionRecord {
        TransactionRecord {
            id: format!("t-{amount}-{category}"),
            customer_id: "c-000001".into(),
            amount,
            merchant_category: category.into(),
            is_international: false,
            transaction_date: Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap(),
            merchant_name: "Acme Office".into(),
        }
    }

    #[test]
    fn mean_count_and_mode() {
        let stats = aggregate(&[txn(10.0, "A"), txn(20.0, "A"), txn(5.0, "B")]);
        assert_eq!(stats.total_transactions, 3);
        assert!((stats.avg_transaction_value - 35.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.top_merchant_category, "A");
    }

    #[test]
    fn no_transactions_yields_zeroes() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total_transactions, 0);
        assert_eq!(stats.avg_transaction_value, 0.0);
        assert_eq!(stats.top_merchant_category, "");
    }

    #[test]
    fn ties_resolve_lexicographically_regardless_of_order() {
        let forward = aggregate(&[txn(1.0, "Restaurants"), txn(1.0, "Hotels & Lodging")]);
        let reverse = aggregate(&[txn(1.0, "Hotels & Lodging"), txn(1.0, "Restaurants")]);
        assert_eq!(forward.top_merchant_category, "Hotels & Lodging");
        assert_eq!(reverse.top_merchant_category, "Hotels & Lodging");
    }

    #[test]
    fn negative_amounts_are_tolerated() {
        let stats = aggregate(&[txn(-10.0, "Utilities"), txn(30.0, "Utilities")]);
        assert_eq!(stats.avg_transaction_value, 10.0);
    }
}
