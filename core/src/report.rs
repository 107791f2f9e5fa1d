//! Read-side reporting over persisted segment assignments.
//!
//! Nothing here re-clusters: segments are rebuilt on every call by grouping
//! customers on their stored segment name.

use crate::{
    customer::CustomerRecord,
    error::SegResult,
    label::SegmentLabel,
    store::CustomerStore,
    transaction::TransactionRecord,
    types::ClusterIndex,
};
use serde::Serialize;

pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SegmentCharacteristics {
    pub avg_spend_volatility: f64,
    pub avg_international_ratio: f64,
    pub avg_payment_timeliness: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SegmentSummary {
    /// Segment index carried by the group's first customer.
    pub id: ClusterIndex,
    pub name: String,
    pub description: String,
    pub customer_count: usize,
    pub avg_monthly_spend: f64,
    pub characteristics: SegmentCharacteristics,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SegmentCount {
    pub name: String,
    pub count: usize,
}

/// One customer with its transactions.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomerDetail {
    pub customer: CustomerRecord,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total_customers: usize,
    pub total_spend: f64,
    pub avg_spend_per_customer: f64,
    pub total_transactions: u64,
    pub segment_distribution: Vec<SegmentCount>,
}

/// Summaries of every segment that currently has customers, in canonical
/// label order. Empty when no customer has been segmented.
pub fn list_segments<S: CustomerStore>(store: &S, limit: usize) -> SegResult<Vec<SegmentSummary>> {
    let customers = store.find_customers(limit)?;

    let summaries = SegmentLabel::ALL
        .into_iter()
        .filter_map(|label| {
            let members: Vec<&CustomerRecord> = customers
                .iter()
                .filter(|c| c.segment_label() == Some(label))
                .collect();
            summarize(label, &members)
        })
        .collect();
    Ok(summaries)
}

fn summarize(label: SegmentLabel, members: &[&CustomerRecord]) -> Option<SegmentSummary> {
    let first = members.first()?;
    let n = members.len() as f64;
    let mean = |f: fn(&CustomerRecord) -> f64| members.iter().map(|c| f(c)).sum::<f64>() / n;

    Some(SegmentSummary {
        id: first.segment_id.unwrap_or(0),
        name: label.name().to_string(),
        description: label.description().to_string(),
        customer_count: members.len(),
        avg_monthly_spend: mean(|c| c.monthly_spend),
        characteristics: SegmentCharacteristics {
            avg_spend_volatility: mean(|c| c.spend_volatility),
            avg_international_ratio: mean(|c| c.international_ratio),
            avg_payment_timeliness: mean(|c| c.payment_timeliness_score),
        },
    })
}

/// Customers whose persisted segment name equals `segment`.
pub fn customers_in_segment<S: CustomerStore>(
    store: &S,
    segment: &str,
    limit: usize,
) -> SegResult<Vec<CustomerRecord>> {
    Ok(store
        .find_customers(limit)?
        .into_iter()
        .filter(|c| c.segment.as_deref() == Some(segment))
        .collect())
}

/// Every customer, segmented or not, in store order.
pub fn list_customers<S: CustomerStore>(store: &S, limit: usize) -> SegResult<Vec<CustomerRecord>> {
    store.find_customers(limit)
}

/// A customer and up to `limit` of its transactions; `None` for an unknown id.
pub fn customer_detail<S: CustomerStore>(
    store: &S,
    customer_id: &str,
    limit: usize,
) -> SegResult<Option<CustomerDetail>> {
    let Some(customer) = store.find_customer(customer_id)? else {
        return Ok(None);
    };
    let transactions = store.find_transactions(customer_id, limit)?;
    Ok(Some(CustomerDetail { customer, transactions }))
}

/// Portfolio totals plus the customer count per segment (including
/// "Unassigned"), in order of first appearance.
pub fn dashboard_stats<S: CustomerStore>(store: &S, limit: usize) -> SegResult<DashboardStats> {
    let customers = store.find_customers(limit)?;
    let total_transactions = store.count_transactions()?;

    let total_spend: f64 = customers.iter().map(|c| c.monthly_spend).sum();
    let avg_spend = if customers.is_empty() {
        0.0
    } else {
        total_spend / customers.len() as f64
    };

    let mut distribution: Vec<SegmentCount> = Vec::new();
    for c in &customers {
        let name = c.segment.as_deref().unwrap_or(UNASSIGNED);
        match distribution.iter_mut().find(|d| d.name == name) {
            Some(entry) => entry.count += 1,
            None => distribution.push(SegmentCount { name: name.to_string(), count: 1 }),
        }
    }

    Ok(DashboardStats {
        total_customers: customers.len(),
        total_spend: round_cents(total_spend),
        avg_spend_per_customer: round_cents(avg_spend),
        total_transactions,
        segment_distribution: distribution,
    })
}

fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
