//! K-means partitioning of the scaled feature matrix.
//!
//! Determinism contract: the same matrix, in the same row order, with the
//! same seed, always yields the same assignment. All randomness comes from
//! the `Clustering` stream of the RngBank.

use crate::{
    config::SegmentationConfig,
    error::{SegError, SegResult},
    rng::{RngBank, StreamSlot},
    types::ClusterIndex,
};
use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};

#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    pub n_clusters: usize,
    /// One cluster index per input row, each in `[0, n_clusters)`.
    pub labels: Vec<ClusterIndex>,
    /// Centroids in scaled space, one row per cluster.
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
}

impl ClusterAssignment {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Partition `scaled` into `n_clusters` groups.
pub fn assign_clusters(
    scaled: &Array2<f64>,
    n_clusters: usize,
    config: &SegmentationConfig,
) -> SegResult<ClusterAssignment> {
    if n_clusters == 0 || scaled.nrows() < n_clusters {
        return Err(SegError::Clustering(format!(
            "cannot form {n_clusters} clusters from {} rows",
            scaled.nrows()
        )));
    }

    let rng = RngBank::new(config.seed)
        .for_stream(StreamSlot::Clustering)
        .into_inner();
    let dataset = DatasetBase::from(scaled.clone());

    let model = KMeans::params_with(n_clusters, rng, L2Dist)
        .n_runs(config.n_init)
        .max_n_iterations(config.max_iterations)
        .tolerance(config.tolerance)
        .fit(&dataset)
        .map_err(|e| SegError::Clustering(e.to_string()))?;

    let predicted: Array1<usize> = model.predict(scaled);
    let centroids = model.centroids().clone();
    let labels = predicted.to_vec();

    if let Some(bad) = labels.iter().find(|&&l| l >= n_clusters) {
        return Err(SegError::InvariantViolation(format!(
            "k-means produced cluster index {bad} for k = {n_clusters}"
        )));
    }

    let inertia = compute_inertia(scaled, &labels, &centroids);
    log::debug!("k-means: k={n_clusters} restarts={} inertia={inertia:.4}", config.n_init);

    Ok(ClusterAssignment {
        n_clusters,
        labels,
        centroids,
        inertia,
    })
}

/// Within-cluster sum of squares.
fn compute_inertia(features: &Array2<f64>, labels: &[ClusterIndex], centroids: &Array2<f64>) -> f64 {
    labels
        .iter()
        .enumerate()
        .map(|(i, &cluster)| {
            features
                .row(i)
                .iter()
                .zip(centroids.row(cluster).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
        })
        .sum()
}
