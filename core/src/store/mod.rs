//! Customer store: the storage collaborator of the segmentation engine.
//!
//! RULE: Only store implementations talk to a database.
//! The pipeline and reporters call `CustomerStore` methods; they never
//! execute SQL directly, so any backend (or an in-memory fake) can be injected.
//!
//! Every method is potentially blocking I/O. Implementations lock per call
//! only; no lock is held between calls.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::{
    aggregate::TransactionStats,
    customer::{CustomerRecord, DerivedFields},
    error::SegResult,
    transaction::TransactionRecord,
};

pub trait CustomerStore: Send {
    /// Up to `limit` customers, in a stable order.
    fn find_customers(&self, limit: usize) -> SegResult<Vec<CustomerRecord>>;

    /// One customer by id; `None` when it does not exist.
    fn find_customer(&self, customer_id: &str) -> SegResult<Option<CustomerRecord>>;

    /// Up to `limit` transactions of one customer, read as one snapshot.
    fn find_transactions(&self, customer_id: &str, limit: usize) -> SegResult<Vec<TransactionRecord>>;

    /// Overwrite segment, segment index and aggregate statistics of one customer.
    fn update_customer_derived_fields(&self, customer_id: &str, fields: &DerivedFields) -> SegResult<()>;

    /// Overwrite only the aggregate statistics of one customer.
    fn update_customer_stats(&self, customer_id: &str, stats: &TransactionStats) -> SegResult<()>;

    fn insert_customers(&self, customers: &[CustomerRecord]) -> SegResult<()>;

    fn insert_transactions(&self, transactions: &[TransactionRecord]) -> SegResult<()>;

    fn count_transactions(&self) -> SegResult<u64>;

    /// Bulk-delete every customer and transaction.
    fn reset(&self) -> SegResult<()>;
}
