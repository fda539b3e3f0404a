use std::{cmp::Ordering, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of decimal places kept on every score that leaves the query engine
pub const SCORE_DECIMALS: i32 = 4;

/// Rounds a score to `SCORE_DECIMALS` places
pub fn round_score(value: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (value * factor).round() / factor
}

/// Classification of a benefit row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BenefitType {
    Discount,
    Cashback,
}

impl BenefitType {
    pub const ALL: [BenefitType; 2] = [BenefitType::Discount, BenefitType::Cashback];

    /// Value stored in the `benefit_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            BenefitType::Discount => "DISCOUNT",
            BenefitType::Cashback => "CASHBACK",
        }
    }
}

impl Display for BenefitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BenefitType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DISCOUNT" => Ok(BenefitType::Discount),
            "CASHBACK" => Ok(BenefitType::Cashback),
            other => Err(AppError::InvalidInput(format!(
                "Unknown benefit type '{}', expected DISCOUNT or CASHBACK",
                other
            ))),
        }
    }
}

/// One pre-computed row of the score store
///
/// A card appears once per (category, benefit type) pair. Rows are produced by
/// the batch job and never modified by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBenefit {
    pub card_id: i64,
    pub profit_id: i64,
    /// Business category the row is ranked in (`kind_name` in the store)
    pub category_name: String,
    pub benefit_type: BenefitType,
    /// Position within (category_name, benefit_type), starting at 1
    pub rank_within_category: i32,
    pub total_score: f64,
    pub benefit_value_score: Option<f64>,
    pub convenience_score: Option<f64>,
    pub accessibility_score: Option<f64>,
    pub category_group_name: Option<String>,
    pub business_kind_name: Option<String>,
    pub benefit_subtype_name: Option<String>,
}

impl ScoredBenefit {
    /// Ranking order: highest score first, lower rank then lower card id on ties
    pub fn score_order(&self, other: &Self) -> Ordering {
        other
            .total_score
            .total_cmp(&self.total_score)
            .then_with(|| self.rank_within_category.cmp(&other.rank_within_category))
            .then_with(|| self.card_id.cmp(&other.card_id))
    }
}

#[cfg(test)]
impl ScoredBenefit {
    /// Minimal row for tests; metadata left empty
    pub fn sample(
        card_id: i64,
        category: &str,
        benefit_type: BenefitType,
        rank: i32,
        score: f64,
    ) -> Self {
        Self {
            card_id,
            profit_id: card_id * 10,
            category_name: category.to_string(),
            benefit_type,
            rank_within_category: rank,
            total_score: score,
            benefit_value_score: None,
            convenience_score: None,
            accessibility_score: None,
            category_group_name: None,
            business_kind_name: None,
            benefit_subtype_name: None,
        }
    }

    pub fn with_business_kind(mut self, kind: Option<&str>) -> Self {
        self.business_kind_name = kind.map(str::to_string);
        self
    }
}
