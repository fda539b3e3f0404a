use serde::{Deserialize, Serialize};

use super::{round_score, BenefitType, ScoredBenefit};

/// Display data for a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInfo {
    pub card_name: String,
    pub card_company: String,
    pub annual_fee: i64,
}

/// Source of card display data
///
/// The score store carries no card names, so every recommendation is joined
/// against a catalog before it is returned.
pub trait CardCatalog: Send + Sync {
    fn lookup(&self, card_id: i64) -> CardInfo;
}

/// Catalog that synthesizes display data from the card id
///
/// Stands in until a real card catalog table is available.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderCardCatalog;

pub const PLACEHOLDER_CARD_COMPANY: &str = "Unknown Card Company";

impl CardCatalog for PlaceholderCardCatalog {
    fn lookup(&self, card_id: i64) -> CardInfo {
        CardInfo {
            card_name: format!("Card {}", card_id),
            card_company: PLACEHOLDER_CARD_COMPANY.to_string(),
            annual_fee: 0,
        }
    }
}

/// A ranked card returned by the recommendation endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecommendation {
    pub card_id: i64,
    pub profit_id: i64,
    pub card_name: String,
    pub card_company: String,
    pub annual_fee: i64,
    pub category_name: String,
    pub benefit_type: BenefitType,
    pub rank_within_category: i32,
    pub total_score: f64,
    pub category_group_name: Option<String>,
    pub business_kind_name: Option<String>,
    pub benefit_subtype_name: Option<String>,
}

impl CardRecommendation {
    pub fn from_row(row: &ScoredBenefit, catalog: &dyn CardCatalog) -> Self {
        let info = catalog.lookup(row.card_id);
        Self {
            card_id: row.card_id,
            profit_id: row.profit_id,
            card_name: info.card_name,
            card_company: info.card_company,
            annual_fee: info.annual_fee,
            category_name: row.category_name.clone(),
            benefit_type: row.benefit_type,
            rank_within_category: row.rank_within_category,
            total_score: round_score(row.total_score),
            category_group_name: row.category_group_name.clone(),
            business_kind_name: row.business_kind_name.clone(),
            benefit_subtype_name: row.benefit_subtype_name.clone(),
        }
    }
}

/// Sub-scores that feed `total_score`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub benefit_value_score: Option<f64>,
    pub convenience_score: Option<f64>,
    pub accessibility_score: Option<f64>,
}

/// One row of a card's benefit breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitEntry {
    pub profit_id: i64,
    pub category_name: String,
    pub benefit_type: BenefitType,
    pub rank_within_category: i32,
    pub total_score: f64,
    pub score_breakdown: ScoreBreakdown,
    pub category_group_name: Option<String>,
    pub business_kind_name: Option<String>,
    pub benefit_subtype_name: Option<String>,
}

impl From<&ScoredBenefit> for BenefitEntry {
    fn from(row: &ScoredBenefit) -> Self {
        Self {
            profit_id: row.profit_id,
            category_name: row.category_name.clone(),
            benefit_type: row.benefit_type,
            rank_within_category: row.rank_within_category,
            total_score: round_score(row.total_score),
            score_breakdown: ScoreBreakdown {
                benefit_value_score: row.benefit_value_score.map(round_score),
                convenience_score: row.convenience_score.map(round_score),
                accessibility_score: row.accessibility_score.map(round_score),
            },
            category_group_name: row.category_group_name.clone(),
            business_kind_name: row.business_kind_name.clone(),
            benefit_subtype_name: row.benefit_subtype_name.clone(),
        }
    }
}

/// Every benefit row of a single card
#[derive(Debug, Clone, PartialEq)]
pub struct CardDetail {
    pub card_id: i64,
    pub info: CardInfo,
    pub benefits: Vec<BenefitEntry>,
}

impl CardDetail {
    pub fn total_benefits(&self) -> usize {
        self.benefits.len()
    }
}

/// Compact row used by the all-categories top list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardScore {
    pub card_id: i64,
    pub profit_id: i64,
    pub kind_name: String,
    pub benefit_type: BenefitType,
    pub kind_name_rank: i32,
    pub total_score: f64,
}

impl From<&ScoredBenefit> for CardScore {
    fn from(row: &ScoredBenefit) -> Self {
        Self {
            card_id: row.card_id,
            profit_id: row.profit_id,
            kind_name: row.category_name.clone(),
            benefit_type: row.benefit_type,
            kind_name_rank: row.rank_within_category,
            total_score: round_score(row.total_score),
        }
    }
}
