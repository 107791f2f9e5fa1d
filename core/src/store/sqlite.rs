//! SQLite persistence layer.

use super::CustomerStore;
use crate::{
    aggregate::TransactionStats,
    customer::{CustomerRecord, DerivedFields},
    error::SegResult,
    transaction::TransactionRecord,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> SegResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SegResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Safe to call repeatedly.
    pub fn migrate(&self) -> SegResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }
}

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<CustomerRecord> {
    Ok(CustomerRecord {
        id: row.get(0)?,
        company_name: row.get(1)?,
        monthly_spend: row.get(2)?,
        spend_volatility: row.get(3)?,
        international_ratio: row.get(4)?,
        payment_timeliness_score: row.get(5)?,
        segment: row.get(6)?,
        segment_id: row
            .get::<_, Option<i64>>(7)?
            .map(|v| usize::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(7, v)))
            .transpose()?,
        total_transactions: row.get::<_, i64>(8)? as u64,
        avg_transaction_value: row.get(9)?,
        top_merchant_category: row.get(10)?,
    })
}

impl CustomerStore for SqliteStore {
    // ── Customer ──────────────────────────────────────────────────

    fn find_customers(&self, limit: usize) -> SegResult<Vec<CustomerRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT customer_id, company_name, monthly_spend, spend_volatility,
                    international_ratio, payment_timeliness_score, segment, segment_id,
                    total_transactions, avg_transaction_value, top_merchant_category
             FROM customer ORDER BY rowid ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], customer_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn find_customer(&self, customer_id: &str) -> SegResult<Option<CustomerRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT customer_id, company_name, monthly_spend, spend_volatility,
                    international_ratio, payment_timeliness_score, segment, segment_id,
                    total_transactions, avg_transaction_value, top_merchant_category
             FROM customer WHERE customer_id = ?1",
        )?;
        stmt.query_row(params![customer_id], customer_from_row)
            .optional()
            .map_err(Into::into)
    }

    fn update_customer_derived_fields(&self, customer_id: &str, fields: &DerivedFields) -> SegResult<()> {
        self.conn.execute(
            "UPDATE customer SET segment = ?1, segment_id = ?2, total_transactions = ?3,
                    avg_transaction_value = ?4, top_merchant_category = ?5
             WHERE customer_id = ?6",
            params![
                fields.segment.name(),
                fields.segment_id as i64,
                fields.stats.total_transactions as i64,
                fields.stats.avg_transaction_value,
                &fields.stats.top_merchant_category,
                customer_id,
            ],
        )?;
        Ok(())
    }

    fn update_customer_stats(&self, customer_id: &str, stats: &TransactionStats) -> SegResult<()> {
        self.conn.execute(
            "UPDATE customer SET total_transactions = ?1, avg_transaction_value = ?2,
                    top_merchant_category = ?3
             WHERE customer_id = ?4",
            params![
                stats.total_transactions as i64,
                stats.avg_transaction_value,
                &stats.top_merchant_category,
                customer_id,
            ],
        )?;
        Ok(())
    }

    fn insert_customers(&self, customers: &[CustomerRecord]) -> SegResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO customer (
                    customer_id, company_name, monthly_spend, spend_volatility,
                    international_ratio, payment_timeliness_score, segment, segment_id,
                    total_transactions, avg_transaction_value, top_merchant_category
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for c in customers {
                stmt.execute(params![
                    &c.id,
                    &c.company_name,
                    c.monthly_spend,
                    c.spend_volatility,
                    c.international_ratio,
                    c.payment_timeliness_score,
                    &c.segment,
                    c.segment_id.map(|v| v as i64),
                    c.total_transactions as i64,
                    c.avg_transaction_value,
                    &c.top_merchant_category,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ── Transactions ──────────────────────────────────────────────

    fn find_transactions(&self, customer_id: &str, limit: usize) -> SegResult<Vec<TransactionRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT transaction_id, customer_id, amount, merchant_category,
                    is_international, transaction_date, merchant_name
             FROM card_transaction WHERE customer_id = ?1
             ORDER BY rowid ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![customer_id, limit as i64], |row| {
            Ok(TransactionRecord {
                id: row.get(0)?,
                customer_id: row.get(1)?,
                amount: row.get(2)?,
                merchant_category: row.get(3)?,
                is_international: row.get::<_, i32>(4)? != 0,
                transaction_date: row.get(5)?,
                merchant_name: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn insert_transactions(&self, transactions: &[TransactionRecord]) -> SegResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO card_transaction (
                    transaction_id, customer_id, amount, merchant_category,
                    is_international, transaction_date, merchant_name
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for t in transactions {
                stmt.execute(params![
                    &t.id,
                    &t.customer_id,
                    t.amount,
                    &t.merchant_category,
                    if t.is_international { 1 } else { 0 },
                    t.transaction_date,
                    &t.merchant_name,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn count_transactions(&self) -> SegResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM card_transaction", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn reset(&self) -> SegResult<()> {
        self.conn
            .execute_batch("DELETE FROM card_transaction; DELETE FROM customer;")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::SegmentLabel;
    use chrono::{TimeZone, Utc};

    fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.migrate().unwrap();
        store
    }

    #[test]
    fn migrate_is_idempotent() {
        let store = store();
        store.migrate().unwrap();
    }

    #[test]
    fn customers_keep_insertion_order_and_derived_fields_persist() {
        let store = store();
        store
            .insert_customers(&[
                CustomerRecord::new("c-2", "Zeta Corp", 5_000.0, 0.2, 0.1, 0.9),
                CustomerRecord::new("c-1", "Alpha Inc", 50_000.0, 0.4, 0.5, 0.7),
            ])
            .unwrap();

        store
            .update_customer_derived_fields(
                "c-1",
                &DerivedFields {
                    segment: SegmentLabel::TravelHeavy,
                    segment_id: 2,
                    stats: TransactionStats {
                        total_transactions: 3,
                        avg_transaction_value: 12.5,
                        top_merchant_category: "Hotels & Lodging".into(),
                    },
                },
            )
            .unwrap();

        let customers = store.find_customers(1000).unwrap();
        assert_eq!(customers[0].id, "c-2");
        assert_eq!(customers[0].segment, None);
        assert_eq!(customers[0].segment_id, None);
        assert_eq!(customers[1].segment_label(), Some(SegmentLabel::TravelHeavy));
        assert_eq!(customers[1].segment_id, Some(2));
        assert_eq!(customers[1].total_transactions, 3);
        assert_eq!(customers[1].top_merchant_category, "Hotels & Lodging");
    }

    #[test]
    fn find_customer_by_id() {
        let store = store();
        store
            .insert_customers(&[CustomerRecord::new("c-1", "Alpha Inc", 50_000.0, 0.4, 0.5, 0.7)])
            .unwrap();

        let found = store.find_customer("c-1").unwrap().expect("c-1 exists");
        assert_eq!(found.company_name, "Alpha Inc");
        assert!(store.find_customer("c-404").unwrap().is_none());
    }

    #[test]
    fn negative_segment_index_is_rejected_on_write() {
        let store = store();
        store
            .insert_customers(&[CustomerRecord::new("c-1", "Alpha Inc", 50_000.0, 0.4, 0.5, 0.7)])
            .unwrap();
        let result = store.conn.execute(
            "UPDATE customer SET segment = 'Stable Mature Accounts', segment_id = -1
             WHERE customer_id = 'c-1'",
            [],
        );
        assert!(result.is_err(), "CHECK constraint should refuse a negative segment_id");
    }

    #[test]
    fn negative_segment_index_is_a_read_error_not_a_huge_index() {
        // Schema without the CHECK, as an older database file would have.
        let store = SqliteStore::in_memory().unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TABLE customer (
                    customer_id TEXT PRIMARY KEY, company_name TEXT, monthly_spend REAL,
                    spend_volatility REAL, international_ratio REAL,
                    payment_timeliness_score REAL, segment TEXT, segment_id INTEGER,
                    total_transactions INTEGER, avg_transaction_value REAL,
                    top_merchant_category TEXT
                 );
                 INSERT INTO customer VALUES
                    ('c-1', 'Alpha Inc', 1.0, 0.1, 0.1, 0.9, 'At-Risk', -1, 0, 0.0, '');",
            )
            .unwrap();

        let err = store.find_customers(10).unwrap_err();
        assert!(err.is_storage_failure(), "unexpected error {err:?}");
        assert!(store.find_customer("c-1").is_err());
    }

    #[test]
    fn transactions_round_trip_and_respect_limit() {
        let store = store();
        let when = Utc.with_ymd_and_hms(2025, 1, 15, 12, 30, 0).unwrap();
        let txns: Vec<TransactionRecord> = (0..5)
            .map(|i| TransactionRecord {
                id: format!("t-{i}"),
                customer_id: "c-1".into(),
                amount: 100.0 + i as f64,
                merchant_category: "Restaurants".into(),
                is_international: i % 2 == 0,
                transaction_date: when,
                merchant_name: "Acme Restaurants".into(),
            })
            .collect();
        store.insert_transactions(&txns).unwrap();

        let all = store.find_transactions("c-1", 1000).unwrap();
        assert_eq!(all, txns);
        assert_eq!(store.find_transactions("c-1", 2).unwrap().len(), 2);
        assert!(store.find_transactions("c-404", 1000).unwrap().is_empty());
        assert_eq!(store.count_transactions().unwrap(), 5);

        store.reset().unwrap();
        assert_eq!(store.count_transactions().unwrap(), 0);
    }
}
