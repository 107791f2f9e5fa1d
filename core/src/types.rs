//! Shared primitive types used across the segmentation engine.

/// A stable, unique identifier for a customer or transaction.
pub type EntityId = String;

/// Opaque cluster index produced by the partitioning step, in `[0, k)`.
pub type ClusterIndex = usize;

/// Number of behavioral features fed to the scaler and cluster assigner.
pub const FEATURE_COUNT: usize = 4;

/// Column order of the feature matrix.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "monthly_spend",
    "spend_volatility",
    "international_ratio",
    "payment_timeliness_score",
];
