//! Segment labeling: turns opaque cluster indices into business segments.
//!
//! Two passes:
//!   1. Ordered rules per cluster (first match wins) produce a preferred label.
//!      The rule order is a business heuristic, not a clustering property.
//!   2. Collision resolution in increasing cluster-index order. A cluster
//!      whose preferred label is taken gets the first unused canonical label.
//!
//! Running out of labels is an invariant violation, never a duplicate.

use crate::{
    config::LabelRules,
    error::{SegError, SegResult},
    types::{ClusterIndex, FEATURE_COUNT},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SegmentLabel {
    HighGrowth,
    TravelHeavy,
    AtRisk,
    StableMature,
}

impl SegmentLabel {
    /// Canonical order. Fallback names are handed out in this order.
    pub const ALL: [SegmentLabel; 4] = [
        Self::HighGrowth,
        Self::TravelHeavy,
        Self::AtRisk,
        Self::StableMature,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::HighGrowth => "High-Growth Corporates",
            Self::TravelHeavy => "Travel-Heavy Corporates",
            Self::AtRisk => "Low-Engagement / At-Risk",
            Self::StableMature => "Stable Mature Accounts",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::HighGrowth => "Fast-growing companies with high spend and expansion potential",
            Self::TravelHeavy => {
                "Companies with significant international travel and global operations"
            }
            Self::AtRisk => "Accounts showing low engagement or payment issues requiring attention",
            Self::StableMature => {
                "Established accounts with consistent, predictable spending patterns"
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.name() == name)
    }
}

impl std::fmt::Display for SegmentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-feature statistics in `types::FEATURE_NAMES` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureStats {
    pub monthly_spend: f64,
    pub spend_volatility: f64,
    pub international_ratio: f64,
    pub payment_timeliness_score: f64,
}

impl From<[f64; FEATURE_COUNT]> for FeatureStats {
    fn from(v: [f64; FEATURE_COUNT]) -> Self {
        Self {
            monthly_spend: v[0],
            spend_volatility: v[1],
            international_ratio: v[2],
            payment_timeliness_score: v[3],
        }
    }
}

/// Raw-feature means of one cluster's members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterProfile {
    pub cluster: ClusterIndex,
    pub size: usize,
    pub means: FeatureStats,
}

/// Build one profile per cluster from raw (unscaled) rows and their labels.
pub fn cluster_profiles(
    rows: &[[f64; FEATURE_COUNT]],
    labels: &[ClusterIndex],
    n_clusters: usize,
) -> Vec<ClusterProfile> {
    let mut sums = vec![[0.0; FEATURE_COUNT]; n_clusters];
    let mut sizes = vec![0usize; n_clusters];
    for (row, &cluster) in rows.iter().zip(labels) {
        sizes[cluster] += 1;
        for (acc, x) in sums[cluster].iter_mut().zip(row) {
            *acc += x;
        }
    }
    (0..n_clusters)
        .map(|cluster| {
            let size = sizes[cluster];
            let mut means = sums[cluster];
            if size > 0 {
                means.iter_mut().for_each(|m| *m /= size as f64);
            }
            ClusterProfile { cluster, size, means: means.into() }
        })
        .collect()
}

/// Population median of each feature column (mean of the middle pair for even n).
pub fn population_medians(rows: &[[f64; FEATURE_COUNT]]) -> FeatureStats {
    let mut out = [0.0; FEATURE_COUNT];
    for (col, slot) in out.iter_mut().enumerate() {
        let mut column: Vec<f64> = rows.iter().map(|r| r[col]).collect();
        *slot = median(&mut column);
    }
    out.into()
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// First matching rule for one cluster's means.
pub fn preferred_label(means: &FeatureStats, medians: &FeatureStats, rules: &LabelRules) -> SegmentLabel {
    if means.monthly_spend > medians.monthly_spend * rules.high_growth_spend_multiplier {
        SegmentLabel::HighGrowth
    } else if means.international_ratio
        > medians.international_ratio * rules.travel_international_multiplier
    {
        SegmentLabel::TravelHeavy
    } else if means.payment_timeliness_score
        < medians.payment_timeliness_score * rules.at_risk_timeliness_multiplier
    {
        SegmentLabel::AtRisk
    } else {
        SegmentLabel::StableMature
    }
}

fn next_unused(used: &mut Vec<SegmentLabel>, cluster: ClusterIndex) -> SegResult<SegmentLabel> {
    let label = SegmentLabel::ALL
        .into_iter()
        .find(|l| !used.contains(l))
        .ok_or_else(|| {
            SegError::InvariantViolation(format!(
                "cluster {cluster} needs a segment label but all {} are in use",
                SegmentLabel::ALL.len()
            ))
        })?;
    used.push(label);
    Ok(label)
}

/// Resolve preferred labels into distinct labels, indexed by cluster.
///
/// `None` marks an empty cluster: it takes no part in the rules and receives
/// a leftover label after every populated cluster is resolved.
pub fn resolve_labels(preferred: &[Option<SegmentLabel>]) -> SegResult<Vec<SegmentLabel>> {
    let mut used: Vec<SegmentLabel> = Vec::with_capacity(preferred.len());
    let mut resolved: Vec<Option<SegmentLabel>> = vec![None; preferred.len()];

    for (cluster, wanted) in preferred.iter().enumerate() {
        let Some(wanted) = *wanted else { continue };
        let label = if used.contains(&wanted) {
            let fallback = next_unused(&mut used, cluster)?;
            log::debug!("label: cluster {cluster} wanted '{wanted}', reassigned to '{fallback}'");
            fallback
        } else {
            used.push(wanted);
            wanted
        };
        resolved[cluster] = Some(label);
    }

    for (cluster, slot) in resolved.iter_mut().enumerate() {
        if slot.is_none() {
            *slot = Some(next_unused(&mut used, cluster)?);
        }
    }

    Ok(resolved.into_iter().flatten().collect())
}

/// Label every cluster: rules over populated clusters, then collision resolution.
pub fn label_clusters(
    profiles: &[ClusterProfile],
    medians: &FeatureStats,
    rules: &LabelRules,
) -> SegResult<Vec<SegmentLabel>> {
    let preferred: Vec<Option<SegmentLabel>> = profiles
        .iter()
        .map(|p| (p.size > 0).then(|| preferred_label(&p.means, medians, rules)))
        .collect();
    resolve_labels(&preferred)
}
