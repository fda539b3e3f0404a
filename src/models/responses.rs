use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    BenefitEntry, BenefitType, CardRecommendation, CardScore, CategoryGroup, CategorySummary,
};

/// Flat ranked list for one benefit type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub benefit_type: BenefitType,
    pub category: Option<String>,
    pub total_count: usize,
    pub recommendations: Vec<CardRecommendation>,
    pub generated_at: DateTime<Utc>,
}

/// Cards of one benefit type inside a business kind response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenefitTypeRecommendations {
    pub benefit_type: BenefitType,
    pub count: usize,
    pub cards: Vec<CardRecommendation>,
}

/// Discount and cashback lists for one business kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessKindResponse {
    pub business_kind_name: String,
    pub discount: BenefitTypeRecommendations,
    pub cashback: BenefitTypeRecommendations,
    pub total_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Per-category top cards for one benefit type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTopCardsResponse {
    pub benefit_type: BenefitType,
    pub top_n: u32,
    pub total_categories: usize,
    pub categories: Vec<CategoryGroup>,
    pub generated_at: DateTime<Utc>,
}

/// Category aggregates for one benefit type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub benefit_type: BenefitType,
    pub total_count: usize,
    pub categories: Vec<CategorySummary>,
    pub generated_at: DateTime<Utc>,
}

/// Full benefit breakdown of a single card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetailResponse {
    pub card_id: i64,
    pub card_name: String,
    pub card_company: String,
    pub annual_fee: i64,
    pub total_benefits: usize,
    pub benefits: Vec<BenefitEntry>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessKindsResponse {
    pub total_count: usize,
    pub business_kinds: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Top five of every category, keyed by category name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllTopCardsResponse {
    pub categories: BTreeMap<String, Vec<CardScore>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database_connected: bool,
    pub version: String,
}
