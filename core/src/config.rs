use crate::error::{SegError, SegResult};
use serde::{Deserialize, Serialize};

/// Smallest population a run may accept. `min_customers` can only raise it.
pub const MIN_SEGMENTABLE_CUSTOMERS: usize = 4;

/// Multipliers applied to population medians by the segment labeler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabelRules {
    /// Cluster mean monthly spend must exceed `median * this` for High-Growth.
    pub high_growth_spend_multiplier: f64,
    /// Cluster mean international ratio must exceed `median * this` for Travel-Heavy.
    pub travel_international_multiplier: f64,
    /// Cluster mean timeliness must fall below `median * this` for At-Risk.
    pub at_risk_timeliness_multiplier: f64,
}

impl Default for LabelRules {
    fn default() -> Self {
        Self {
            high_growth_spend_multiplier: 1.5,
            travel_international_multiplier: 1.3,
            at_risk_timeliness_multiplier: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Fixed seed for k-means initialization.
    pub seed: u64,
    /// Number of k-means restarts; the lowest-inertia fit is kept.
    pub n_init: usize,
    pub max_iterations: u64,
    pub tolerance: f64,
    /// Upper bound on k; the engine uses min(max_clusters, customer_count).
    pub max_clusters: usize,
    /// Runs with fewer customers are rejected with InsufficientData.
    /// Never below `MIN_SEGMENTABLE_CUSTOMERS`.
    pub min_customers: usize,
    /// Ceiling on customers per run and transactions per customer.
    pub fetch_limit: usize,
    /// Standard deviations below this are treated as a constant column.
    pub variance_floor: f64,
    pub rules: LabelRules,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            max_clusters: 4,
            min_customers: MIN_SEGMENTABLE_CUSTOMERS,
            fetch_limit: 1000,
            variance_floor: 1e-12,
            rules: LabelRules::default(),
        }
    }
}

impl SegmentationConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &str) -> SegResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SegError::Config(format!("Cannot read {path}: {e}")))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SegResult<()> {
        if self.n_init == 0 {
            return Err(SegError::Config("n_init must be at least 1".into()));
        }
        if self.max_clusters == 0 || self.max_clusters > crate::label::SegmentLabel::ALL.len() {
            return Err(SegError::Config(format!(
                "max_clusters must be in 1..={}, got {}",
                crate::label::SegmentLabel::ALL.len(),
                self.max_clusters
            )));
        }
        if self.min_customers < MIN_SEGMENTABLE_CUSTOMERS {
            return Err(SegError::Config(format!(
                "min_customers must be at least {MIN_SEGMENTABLE_CUSTOMERS}, got {}",
                self.min_customers
            )));
        }
        if self.min_customers < self.max_clusters {
            return Err(SegError::Config(format!(
                "min_customers ({}) must be >= max_clusters ({})",
                self.min_customers, self.max_clusters
            )));
        }
        if self.fetch_limit < self.min_customers {
            return Err(SegError::Config(format!(
                "fetch_limit ({}) must be >= min_customers ({})",
                self.fetch_limit, self.min_customers
            )));
        }
        if !(self.tolerance > 0.0) || !(self.variance_floor > 0.0) {
            return Err(SegError::Config(
                "tolerance and variance_floor must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Number of clusters for a population of `n` customers.
    pub fn cluster_count(&self, n: usize) -> usize {
        self.max_clusters.min(n)
    }
}

/// Shape of the synthetic dataset produced by `seed::generate_dataset`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    pub customer_count: usize,
    pub min_transactions: u64,
    pub max_transactions: u64,
    /// Transactions are dated within this many days before "now".
    pub history_days: i64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            customer_count: 150,
            min_transactions: 20,
            max_transactions: 100,
            history_days: 90,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SegmentationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.cluster_count(150), 4);
        assert_eq!(config.cluster_count(3), 3);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SegmentationConfig =
            serde_json::from_str(r#"{ "seed": 7, "rules": { "at_risk_timeliness_multiplier": 0.7 } }"#)
                .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_init, 10);
        assert_eq!(config.rules.at_risk_timeliness_multiplier, 0.7);
        assert_eq!(config.rules.high_growth_spend_multiplier, 1.5);
    }

    #[test]
    fn zero_restarts_is_rejected() {
        let config = SegmentationConfig { n_init: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(SegError::Config(_))));
    }

    #[test]
    fn min_customers_cannot_drop_below_four() {
        let config = SegmentationConfig { max_clusters: 1, min_customers: 1, ..Default::default() };
        assert!(matches!(config.validate(), Err(SegError::Config(_))));

        let raised = SegmentationConfig { min_customers: 10, ..Default::default() };
        raised.validate().unwrap();
    }

    #[test]
    fn more_clusters_than_labels_is_rejected() {
        let config = SegmentationConfig { max_clusters: 5, min_customers: 5, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SegmentationConfig::load("/nonexistent/segmentation.json").unwrap_err();
        assert!(matches!(err, SegError::Config(_)));
        assert!(err.to_string().contains("Cannot read"));
    }

    fn write_temp(name: &str, content: &str) -> String {
        let path = std::env::temp_dir().join(format!("cardseg-{}-{name}", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn load_reports_malformed_json_as_serialization_error() {
        let path = write_temp("malformed.json", "{ \"seed\": ");
        let err = SegmentationConfig::load(&path).unwrap_err();
        assert!(matches!(err, SegError::Serialization(_)), "unexpected error {err:?}");
    }

    #[test]
    fn load_validates_after_parsing() {
        let path = write_temp("invalid.json", r#"{ "n_init": 0 }"#);
        let err = SegmentationConfig::load(&path).unwrap_err();
        assert!(matches!(err, SegError::Config(_)), "unexpected error {err:?}");

        let path = write_temp("valid.json", r#"{ "seed": 9 }"#);
        assert_eq!(SegmentationConfig::load(&path).unwrap().seed, 9);
    }
}
