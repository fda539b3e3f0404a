//! Builds the HTTP response bodies from query engine results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        AllTopCardsResponse, BenefitType, BenefitTypeRecommendations, BenefitTypeSplit,
        BusinessKindResponse, BusinessKindsResponse, CardDetail, CardDetailResponse,
        CardRecommendation, CardScore, CategoriesResponse, CategoryGroup, CategorySummary,
        CategoryTopCardsResponse, RecommendationResponse,
    },
};

pub fn recommendation_response(
    benefit_type: BenefitType,
    category: Option<String>,
    recommendations: Vec<CardRecommendation>,
    generated_at: DateTime<Utc>,
) -> RecommendationResponse {
    RecommendationResponse {
        benefit_type,
        category,
        total_count: recommendations.len(),
        recommendations,
        generated_at,
    }
}

fn benefit_type_section(
    benefit_type: BenefitType,
    cards: Vec<CardRecommendation>,
) -> BenefitTypeRecommendations {
    BenefitTypeRecommendations {
        benefit_type,
        count: cards.len(),
        cards,
    }
}

/// Discount and cashback sections for a business kind
///
/// A benefit type without rows still gets a zero-count section. Only a kind
/// with no rows at all is reported as not found.
pub fn business_kind_response(
    business_kind_name: String,
    split: BenefitTypeSplit,
    generated_at: DateTime<Utc>,
) -> AppResult<BusinessKindResponse> {
    if split.is_empty() {
        return Err(AppError::NotFound(format!(
            "No recommendations found for business kind '{}'",
            business_kind_name
        )));
    }

    let total_count = split.total_count();
    Ok(BusinessKindResponse {
        business_kind_name,
        discount: benefit_type_section(BenefitType::Discount, split.discount),
        cashback: benefit_type_section(BenefitType::Cashback, split.cashback),
        total_count,
        generated_at,
    })
}

pub fn category_top_cards_response(
    benefit_type: BenefitType,
    top_n: u32,
    categories: Vec<CategoryGroup>,
    generated_at: DateTime<Utc>,
) -> CategoryTopCardsResponse {
    CategoryTopCardsResponse {
        benefit_type,
        top_n,
        total_categories: categories.len(),
        categories,
        generated_at,
    }
}

pub fn categories_response(
    benefit_type: BenefitType,
    categories: Vec<CategorySummary>,
    generated_at: DateTime<Utc>,
) -> CategoriesResponse {
    CategoriesResponse {
        benefit_type,
        total_count: categories.len(),
        categories,
        generated_at,
    }
}

/// Card breakdown, or not found when the card has no rows
pub fn card_detail_response(
    card_id: i64,
    detail: Option<CardDetail>,
    generated_at: DateTime<Utc>,
) -> AppResult<CardDetailResponse> {
    let detail =
        detail.ok_or_else(|| AppError::NotFound(format!("Card {} not found", card_id)))?;

    Ok(CardDetailResponse {
        card_id: detail.card_id,
        total_benefits: detail.total_benefits(),
        card_name: detail.info.card_name,
        card_company: detail.info.card_company,
        annual_fee: detail.info.annual_fee,
        benefits: detail.benefits,
        generated_at,
    })
}

pub fn business_kinds_response(
    business_kinds: Vec<String>,
    generated_at: DateTime<Utc>,
) -> BusinessKindsResponse {
    BusinessKindsResponse {
        total_count: business_kinds.len(),
        business_kinds,
        generated_at,
    }
}

pub fn all_top_cards_response(categories: BTreeMap<String, Vec<CardScore>>) -> AllTopCardsResponse {
    AllTopCardsResponse { categories }
}
