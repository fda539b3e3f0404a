use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{BenefitType, CategoryStats, ScoredBenefit},
    services::query_engine,
};

use super::{ScoreFilter, ScoreStore};

/// Score store over a fixed snapshot of rows
///
/// Used for tests and local fixtures where no database is available.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScoreStore {
    rows: Vec<ScoredBenefit>,
}

impl InMemoryScoreStore {
    pub fn new(rows: Vec<ScoredBenefit>) -> Self {
        Self { rows }
    }
}

/// Applies the filter's row caps to already matching rows
fn apply_caps(mut rows: Vec<ScoredBenefit>, filter: &ScoreFilter) -> Vec<ScoredBenefit> {
    if filter.limit.is_none() && filter.per_category_limit.is_none() {
        return rows;
    }

    rows.sort_by(ScoredBenefit::score_order);

    if let Some(per_category) = filter.per_category_limit {
        let mut seen: HashMap<(String, BenefitType), u32> = HashMap::new();
        rows.retain(|row| {
            let count = seen
                .entry((row.category_name.clone(), row.benefit_type))
                .or_default();
            *count += 1;
            *count <= per_category
        });
    }
    if let Some(limit) = filter.limit {
        rows.truncate(limit as usize);
    }
    rows
}

#[async_trait::async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn fetch(&self, filter: &ScoreFilter) -> AppResult<Vec<ScoredBenefit>> {
        let matching = self
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        Ok(apply_caps(matching, filter))
    }

    async fn business_kinds(&self) -> AppResult<Vec<String>> {
        Ok(query_engine::available_business_kinds(&self.rows))
    }

    async fn category_stats(&self, benefit_type: BenefitType) -> AppResult<Vec<CategoryStats>> {
        Ok(query_engine::category_stats(&self.rows, benefit_type))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
