//! In-memory customer store for tests and dry runs.

use super::CustomerStore;
use crate::{
    aggregate::TransactionStats,
    customer::{CustomerRecord, DerivedFields},
    error::{SegError, SegResult},
    transaction::TransactionRecord,
};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    customers: Vec<CustomerRecord>,
    transactions: Vec<TransactionRecord>,
    updates: usize,
    /// Fail every update once this many have succeeded.
    fail_after: Option<usize>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(customers: Vec<CustomerRecord>, transactions: Vec<TransactionRecord>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                customers,
                transactions,
                ..Default::default()
            }),
        }
    }

    /// Number of successful customer updates since creation.
    pub fn update_count(&self) -> usize {
        self.lock().map(|inner| inner.updates).unwrap_or(0)
    }

    /// Make every customer update after the first `n` successful ones fail.
    pub fn fail_updates_after(&self, n: usize) {
        if let Ok(mut inner) = self.lock() {
            inner.fail_after = Some(n);
        }
    }

    pub fn clear_failure(&self) {
        if let Ok(mut inner) = self.lock() {
            inner.fail_after = None;
        }
    }

    fn lock(&self) -> SegResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| SegError::Storage {
            op: "lock",
            detail: "memory store mutex poisoned".into(),
        })
    }

    fn update_with(
        &self,
        op: &'static str,
        customer_id: &str,
        apply: impl FnOnce(&mut CustomerRecord),
    ) -> SegResult<()> {
        let mut inner = self.lock()?;
        if inner.fail_after.is_some_and(|n| inner.updates >= n) {
            return Err(SegError::Storage {
                op,
                detail: format!("injected failure updating {customer_id}"),
            });
        }
        // Unknown ids are a no-op, as with an UPDATE matching zero rows.
        if let Some(customer) = inner.customers.iter_mut().find(|c| c.id == customer_id) {
            apply(customer);
        }
        inner.updates += 1;
        Ok(())
    }
}

impl CustomerStore for MemoryStore {
    fn find_customers(&self, limit: usize) -> SegResult<Vec<CustomerRecord>> {
        Ok(self.lock()?.customers.iter().take(limit).cloned().collect())
    }

    fn find_customer(&self, customer_id: &str) -> SegResult<Option<CustomerRecord>> {
        Ok(self.lock()?.customers.iter().find(|c| c.id == customer_id).cloned())
    }

    fn find_transactions(&self, customer_id: &str, limit: usize) -> SegResult<Vec<TransactionRecord>> {
        Ok(self
            .lock()?
            .transactions
            .iter()
            .filter(|t| t.customer_id == customer_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn update_customer_derived_fields(&self, customer_id: &str, fields: &DerivedFields) -> SegResult<()> {
        self.update_with("update_customer_derived_fields", customer_id, |c| c.apply_derived(fields))
    }

    fn update_customer_stats(&self, customer_id: &str, stats: &TransactionStats) -> SegResult<()> {
        self.update_with("update_customer_stats", customer_id, |c| c.apply_stats(stats))
    }

    fn insert_customers(&self, customers: &[CustomerRecord]) -> SegResult<()> {
        self.lock()?.customers.extend_from_slice(customers);
        Ok(())
    }

    fn insert_transactions(&self, transactions: &[TransactionRecord]) -> SegResult<()> {
        self.lock()?.transactions.extend_from_slice(transactions);
        Ok(())
    }

    fn count_transactions(&self) -> SegResult<u64> {
        Ok(self.lock()?.transactions.len() as u64)
    }

    fn reset(&self) -> SegResult<()> {
        let mut inner = self.lock()?;
        inner.customers.clear();
        inner.transactions.clear();
        Ok(())
    }
}
