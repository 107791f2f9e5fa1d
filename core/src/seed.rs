//! Synthetic corporate card dataset.
//!
//! Fully deterministic for a given (SeedConfig, seed, now): ids, names,
//! features and transactions all come from RngBank streams.

use crate::{
    config::SeedConfig,
    customer::CustomerRecord,
    error::SegResult,
    name_generator::NameGenerator,
    rng::{RngBank, StreamRng, StreamSlot},
    store::CustomerStore,
    transaction::{TransactionRecord, MERCHANT_CATEGORIES},
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Monthly spend tiers a synthetic customer is drawn from.
pub const SPEND_TIERS: [f64; 6] = [5_000.0, 15_000.0, 30_000.0, 50_000.0, 80_000.0, 120_000.0];

pub struct SyntheticDataset {
    pub customers: Vec<CustomerRecord>,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub customers_created: usize,
    pub transactions_created: usize,
}

pub fn generate_dataset(config: &SeedConfig, seed: u64, now: DateTime<Utc>) -> SyntheticDataset {
    let bank = RngBank::new(seed);
    let mut customer_rng = bank.for_stream(StreamSlot::Customers);
    let mut txn_rng = bank.for_stream(StreamSlot::Transactions);

    let mut customers = Vec::with_capacity(config.customer_count);
    let mut transactions = Vec::new();

    for i in 0..config.customer_count {
        let base_spend = *customer_rng.pick(&SPEND_TIERS);
        let volatility = customer_rng.uniform(0.1, 0.8);
        let international_ratio = customer_rng.uniform(0.0, 0.7);
        let timeliness = customer_rng.uniform(0.6, 1.0);

        let customer = CustomerRecord::new(
            mint_id(&mut customer_rng),
            NameGenerator::company_name(&mut customer_rng, i + 1),
            base_spend,
            volatility,
            international_ratio,
            timeliness,
        );

        let count = txn_rng.range_inclusive(config.min_transactions, config.max_transactions);
        let per_txn = base_spend / count as f64;
        for _ in 0..count {
            let amount = txn_rng.normal(per_txn, per_txn * volatility).abs();
            let category = *txn_rng.pick(&MERCHANT_CATEGORIES);
            let days_ago = txn_rng.next_u64_below(config.history_days.max(0) as u64 + 1) as i64;
            transactions.push(TransactionRecord {
                id: mint_id(&mut txn_rng),
                customer_id: customer.id.clone(),
                amount: (amount * 100.0).round() / 100.0,
                merchant_category: category.to_string(),
                is_international: txn_rng.chance(international_ratio),
                transaction_date: now - Duration::days(days_ago),
                merchant_name: NameGenerator::merchant_name(&mut txn_rng, category),
            });
        }
        customers.push(customer);
    }

    SyntheticDataset { customers, transactions }
}

/// Clear the store and load a fresh synthetic dataset. Segmentation is
/// left to the caller.
pub fn reset_and_seed<S: CustomerStore>(
    store: &S,
    config: &SeedConfig,
    seed: u64,
    now: DateTime<Utc>,
) -> SegResult<SeedReport> {
    let dataset = generate_dataset(config, seed, now);
    store.reset()?;
    store.insert_customers(&dataset.customers)?;
    store.insert_transactions(&dataset.transactions)?;
    log::info!(
        "seed: {} customers, {} transactions (seed={seed})",
        dataset.customers.len(),
        dataset.transactions.len()
    );
    Ok(SeedReport {
        customers_created: dataset.customers.len(),
        transactions_created: dataset.transactions.len(),
    })
}

fn mint_id(rng: &mut StreamRng) -> String {
    uuid::Builder::from_random_bytes(rng.next_bytes16())
        .into_uuid()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn small() -> SeedConfig {
        SeedConfig { customer_count: 12, ..Default::default() }
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = generate_dataset(&small(), 42, now());
        let b = generate_dataset(&small(), 42, now());
        assert_eq!(a.customers, b.customers);
        assert_eq!(a.transactions, b.transactions);
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_dataset(&small(), 42, now());
        let b = generate_dataset(&small(), 99, now());
        assert_ne!(a.customers, b.customers);
    }

    #[test]
    fn features_and_transactions_stay_in_range() {
        let config = small();
        let data = generate_dataset(&config, 7, now());
        assert_eq!(data.customers.len(), 12);
        for c in &data.customers {
            assert!(SPEND_TIERS.contains(&c.monthly_spend));
            assert!((0.1..0.8).contains(&c.spend_volatility));
            assert!((0.0..0.7).contains(&c.international_ratio));
            assert!((0.6..1.0).contains(&c.payment_timeliness_score));
            assert!(c.segment.is_none() && c.segment_id.is_none());

            let n = data.transactions.iter().filter(|t| t.customer_id == c.id).count() as u64;
            assert!((config.min_transactions..=config.max_transactions).contains(&n));
        }
        for t in &data.transactions {
            assert!(t.amount >= 0.0);
            assert!(MERCHANT_CATEGORIES.contains(&t.merchant_category.as_str()));
            assert!(t.transaction_date <= now());
            assert!(now() - t.transaction_date <= Duration::days(config.history_days));
        }
    }
}
