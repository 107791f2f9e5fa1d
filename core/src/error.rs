use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegError {
    #[error("Insufficient data: found {found} customers, segmentation requires at least {required}")]
    InsufficientData { found: usize, required: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage failure during {op}: {detail}")]
    Storage { op: &'static str, detail: String },

    #[error("Clustering failed: {0}")]
    Clustering(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SegError {
    /// True when the run was rejected because there is nothing to segment yet.
    /// Seeding and import flows treat this as "load more data", not "retry".
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }

    /// True when a read or write against the customer store failed.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Storage { .. })
    }
}

pub type SegResult<T> = Result<T, SegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_is_not_a_storage_failure() {
        let err = SegError::InsufficientData { found: 2, required: 4 };
        assert!(err.is_insufficient_data());
        assert!(!err.is_storage_failure());
        assert_eq!(
            err.to_string(),
            "Insufficient data: found 2 customers, segmentation requires at least 4"
        );
    }

    #[test]
    fn storage_variants_are_classified_as_storage_failures() {
        let err = SegError::Storage { op: "find_customers", detail: "connection reset".into() };
        assert!(err.is_storage_failure());
        assert!(!err.is_insufficient_data());

        let db = SegError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(db.is_storage_failure());
    }
}
