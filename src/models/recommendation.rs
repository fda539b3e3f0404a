use serde::{Deserialize, Serialize};

use super::{BenefitType, CardRecommendation};

/// Top cards of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category_name: String,
    pub cards: Vec<CardRecommendation>,
}

/// Aggregate figures for one category under a benefit type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category_name: String,
    /// Distinct cards scored in this category
    pub card_count: usize,
    pub avg_score: f64,
    pub max_score: f64,
}

/// Unrounded per-category aggregates as computed by the store
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CategoryStats {
    pub category_name: String,
    pub card_count: i64,
    pub avg_score: f64,
    pub max_score: f64,
}

/// Recommendations split by benefit type
///
/// Both lists are always present, even when one of them is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BenefitTypeSplit {
    pub discount: Vec<CardRecommendation>,
    pub cashback: Vec<CardRecommendation>,
}

impl BenefitTypeSplit {
    pub fn get(&self, benefit_type: BenefitType) -> &[CardRecommendation] {
        match benefit_type {
            BenefitType::Discount => &self.discount,
            BenefitType::Cashback => &self.cashback,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.discount.is_empty() && self.cashback.is_empty()
    }

    pub fn total_count(&self) -> usize {
        self.discount.len() + self.cashback.len()
    }
}
