use crate::{
    aggregate::TransactionStats,
    label::SegmentLabel,
    types::{ClusterIndex, EntityId, FEATURE_COUNT},
};
use serde::{Deserialize, Serialize};

/// A corporate card customer as held by the customer store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    pub id: EntityId,
    pub company_name: String,
    pub monthly_spend: f64,
    pub spend_volatility: f64,
    pub international_ratio: f64,
    pub payment_timeliness_score: f64,
    // Derived fields, rewritten by every segmentation run.
    pub segment: Option<String>,
    pub segment_id: Option<ClusterIndex>,
    pub total_transactions: u64,
    pub avg_transaction_value: f64,
    pub top_merchant_category: String,
}

impl CustomerRecord {
    /// A freshly imported customer with no derived state.
    pub fn new(
        id: impl Into<EntityId>,
        company_name: impl Into<String>,
        monthly_spend: f64,
        spend_volatility: f64,
        international_ratio: f64,
        payment_timeliness_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            company_name: company_name.into(),
            monthly_spend,
            spend_volatility,
            international_ratio,
            payment_timeliness_score,
            segment: None,
            segment_id: None,
            total_transactions: 0,
            avg_transaction_value: 0.0,
            top_merchant_category: String::new(),
        }
    }

    /// The clustering input, in `types::FEATURE_NAMES` order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.monthly_spend,
            self.spend_volatility,
            self.international_ratio,
            self.payment_timeliness_score,
        ]
    }

    /// The persisted segment, if it is one of the canonical labels.
    pub fn segment_label(&self) -> Option<SegmentLabel> {
        self.segment.as_deref().and_then(SegmentLabel::from_name)
    }

    pub(crate) fn apply_derived(&mut self, fields: &DerivedFields) {
        self.segment = Some(fields.segment.name().to_string());
        self.segment_id = Some(fields.segment_id);
        self.apply_stats(&fields.stats);
    }

    pub(crate) fn apply_stats(&mut self, stats: &TransactionStats) {
        self.total_transactions = stats.total_transactions;
        self.avg_transaction_value = stats.avg_transaction_value;
        self.top_merchant_category = stats.top_merchant_category.clone();
    }
}

/// Everything the persistence writer sets on a customer in one run.
/// Segment name and index always travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFields {
    pub segment: SegmentLabel,
    pub segment_id: ClusterIndex,
    pub stats: TransactionStats,
}
