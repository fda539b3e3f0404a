use crate::{
    error::AppResult,
    models::{BenefitType, CategoryStats, ScoredBenefit},
};

/// Filters and row caps applied at the store boundary
///
/// An unset field matches every row. The caps keep only the best rows under
/// `ScoredBenefit::score_order`; the query engine still applies its own
/// ordering and limits to whatever comes back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreFilter {
    pub benefit_type: Option<BenefitType>,
    pub category: Option<String>,
    pub business_kind: Option<String>,
    pub card_id: Option<i64>,
    /// Keep rows whose rank is at most this value
    pub max_rank: Option<i32>,
    /// Return at most this many rows overall
    pub limit: Option<u32>,
    /// Return at most this many rows per (category, benefit type)
    pub per_category_limit: Option<u32>,
}

impl ScoreFilter {
    /// Matches every row in the table
    pub fn all() -> Self {
        Self::default()
    }

    pub fn benefit_type(mut self, benefit_type: BenefitType) -> Self {
        self.benefit_type = Some(benefit_type);
        self
    }

    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn business_kind(mut self, business_kind: impl Into<String>) -> Self {
        self.business_kind = Some(business_kind.into());
        self
    }

    pub fn card_id(mut self, card_id: i64) -> Self {
        self.card_id = Some(card_id);
        self
    }

    pub fn max_rank(mut self, max_rank: i32) -> Self {
        self.max_rank = Some(max_rank);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn per_category_limit(mut self, limit: u32) -> Self {
        self.per_category_limit = Some(limit);
        self
    }

    /// Whether a row passes the equality and rank filters; caps are not considered
    pub fn matches(&self, row: &ScoredBenefit) -> bool {
        self.benefit_type.map_or(true, |bt| row.benefit_type == bt)
            && self
                .category
                .as_deref()
                .map_or(true, |c| row.category_name == c)
            && self
                .business_kind
                .as_deref()
                .map_or(true, |k| row.business_kind_name.as_deref() == Some(k))
            && self.card_id.map_or(true, |id| row.card_id == id)
            && self
                .max_rank
                .map_or(true, |rank| row.rank_within_category <= rank)
    }
}

/// Read-only access to the pre-computed score table
///
/// Implementations return fully typed rows. Any failure to reach or read the
/// store is an error; an empty result is not.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ScoreStore: Send + Sync {
    /// Fetch the rows matching the filter, honouring its row caps
    async fn fetch(&self, filter: &ScoreFilter) -> AppResult<Vec<ScoredBenefit>>;

    /// Distinct non-blank business kinds
    async fn business_kinds(&self) -> AppResult<Vec<String>>;

    /// Per-category aggregates for one benefit type, in no particular order
    async fn category_stats(&self, benefit_type: BenefitType) -> AppResult<Vec<CategoryStats>>;

    /// Round-trip to the store to confirm it is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}
