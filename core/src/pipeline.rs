//! The segmentation pipeline.
//!
//! EXECUTION ORDER (fixed, one synchronous pass per trigger):
//!   1. Read customers (bounded by fetch_limit); reject if too few.
//!   2. Feature aggregation: one transaction fetch per customer.
//!   3. Scaling: refit on this run's population.
//!   4. Cluster assignment: seeded k-means, k = min(max_clusters, n).
//!   5. Segment labeling: ordered rules + collision resolution.
//!   6. Persistence: one write per customer.
//!
//! RULES:
//!   - Nothing is written before step 6; every failure in 1-5 leaves the
//!     store untouched.
//!   - Step 6 is not transactional. A failure mid-way leaves a mixed state;
//!     rerunning overwrites every derived field, so reruns are the recovery.
//!   - No lock spans the run. Concurrent runs are last-writer-wins per
//!     customer; callers that need more must serialize triggers.

use crate::{
    aggregate::{aggregate, TransactionStats},
    cluster::assign_clusters,
    config::SegmentationConfig,
    customer::{CustomerRecord, DerivedFields},
    error::{SegError, SegResult},
    label::{cluster_profiles, label_clusters, population_medians, ClusterProfile, SegmentLabel},
    scaler::StandardScaler,
    store::CustomerStore,
    types::{ClusterIndex, FEATURE_COUNT, FEATURE_NAMES},
};
use ndarray::Array2;
use serde::Serialize;

/// One labeled cluster of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct LabeledCluster {
    pub segment_id: ClusterIndex,
    pub label: SegmentLabel,
    pub profile: ClusterProfile,
}

/// Result of `run_segmentation`.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentationSummary {
    pub segments_created: usize,
    pub customers_segmented: usize,
    pub inertia: f64,
    pub segments: Vec<LabeledCluster>,
}

pub struct SegmentationEngine<S: CustomerStore> {
    store: S,
    config: SegmentationConfig,
}

impl<S: CustomerStore> SegmentationEngine<S> {
    pub fn new(store: S, config: SegmentationConfig) -> SegResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn with_defaults(store: S) -> Self {
        Self {
            store,
            config: SegmentationConfig::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Recompute every customer's segment from scratch.
    pub fn run_segmentation(&self) -> SegResult<SegmentationSummary> {
        let customers = self.store.find_customers(self.config.fetch_limit)?;
        let n = customers.len();
        if n < self.config.min_customers {
            log::warn!(
                "segmentation: rejected, {n} customers < minimum {}",
                self.config.min_customers
            );
            return Err(SegError::InsufficientData {
                found: n,
                required: self.config.min_customers,
            });
        }

        let stats = self.aggregate_all(&customers)?;

        let rows: Vec<[f64; FEATURE_COUNT]> = customers.iter().map(CustomerRecord::features).collect();
        let raw = feature_matrix(&rows)?;
        let (scaler, scaled) = StandardScaler::fit_transform(&raw, self.config.variance_floor);
        for &col in &scaler.degenerate {
            log::warn!(
                "segmentation: feature '{}' has zero variance, treated as constant",
                FEATURE_NAMES[col]
            );
        }

        let k = self.config.cluster_count(n);
        let assignment = assign_clusters(&scaled, k, &self.config)?;

        let profiles = cluster_profiles(&rows, &assignment.labels, k);
        let medians = population_medians(&rows);
        let labels = label_clusters(&profiles, &medians, &self.config.rules)?;

        for ((customer, stats), &cluster) in customers.iter().zip(stats).zip(&assignment.labels) {
            let fields = DerivedFields {
                segment: labels[cluster],
                segment_id: cluster,
                stats,
            };
            self.store.update_customer_derived_fields(&customer.id, &fields)?;
        }

        let segments: Vec<LabeledCluster> = profiles
            .into_iter()
            .zip(&labels)
            .map(|(profile, &label)| LabeledCluster {
                segment_id: profile.cluster,
                label,
                profile,
            })
            .collect();
        for s in &segments {
            log::info!(
                "segmentation: cluster {} -> '{}' ({} customers)",
                s.segment_id,
                s.label,
                s.profile.size
            );
        }
        log::info!(
            "segmentation: {n} customers in {k} segments, inertia={:.4}",
            assignment.inertia
        );

        Ok(SegmentationSummary {
            segments_created: k,
            customers_segmented: n,
            inertia: assignment.inertia,
            segments,
        })
    }

    /// Recompute only the transaction statistics of customers that have
    /// transactions. Segments are left as they are.
    pub fn refresh_customer_statistics(&self) -> SegResult<usize> {
        let customers = self.store.find_customers(self.config.fetch_limit)?;
        let mut refreshed = 0usize;
        for customer in &customers {
            let transactions = self.store.find_transactions(&customer.id, self.config.fetch_limit)?;
            if transactions.is_empty() {
                continue;
            }
            self.store.update_customer_stats(&customer.id, &aggregate(&transactions))?;
            refreshed += 1;
        }
        log::info!("statistics: refreshed {refreshed} of {} customers", customers.len());
        Ok(refreshed)
    }

    fn aggregate_all(&self, customers: &[CustomerRecord]) -> SegResult<Vec<TransactionStats>> {
        customers
            .iter()
            .map(|c| {
                let transactions = self.store.find_transactions(&c.id, self.config.fetch_limit)?;
                Ok(aggregate(&transactions))
            })
            .collect()
    }
}

fn feature_matrix(rows: &[[f64; FEATURE_COUNT]]) -> SegResult<Array2<f64>> {
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), FEATURE_COUNT), flat)
        .map_err(|e| SegError::InvariantViolation(format!("feature matrix shape: {e}")))
}
