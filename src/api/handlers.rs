use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{
        AllTopCardsResponse, BenefitType, BusinessKindResponse, BusinessKindsResponse,
        CardDetailResponse, CategoriesResponse, CategoryTopCardsResponse, RecommendationResponse,
    },
    services::assembler,
};

use super::{
    extract::{ApiPath, ApiQuery},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub category: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TopCardsQuery {
    pub top_n: Option<u32>,
}

/// Blank filters are treated as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Ranked cards for one benefit type
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(benefit_type): ApiPath<String>,
    ApiQuery(params): ApiQuery<RecommendQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let benefit_type: BenefitType = benefit_type.parse()?;
    let limit = state.limits.resolve_limit(params.limit)?;
    let category = non_blank(params.category);

    tracing::info!(
        request_id = %request_id,
        benefit_type = %benefit_type,
        category = ?category,
        limit,
        "Processing recommendation request"
    );

    let recommendations = state
        .recommendations
        .top_by_category(benefit_type, category.clone(), limit)
        .await?;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.len(),
        "Recommendations ranked"
    );

    Ok(Json(assembler::recommendation_response(
        benefit_type,
        category,
        recommendations,
        Utc::now(),
    )))
}

/// Discount and cashback lists for a business kind
pub async fn business_kind(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(business_kind_name): ApiPath<String>,
    ApiQuery(params): ApiQuery<LimitQuery>,
) -> AppResult<Json<BusinessKindResponse>> {
    let limit = state.limits.resolve_limit(params.limit)?;

    tracing::info!(
        request_id = %request_id,
        business_kind = %business_kind_name,
        limit,
        "Processing business kind request"
    );

    let split = state
        .recommendations
        .top_by_business_kind(&business_kind_name, limit)
        .await?;

    let response = assembler::business_kind_response(business_kind_name, split, Utc::now())?;
    Ok(Json(response))
}

/// Category aggregates for a benefit type
pub async fn categories(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(benefit_type): ApiPath<String>,
) -> AppResult<Json<CategoriesResponse>> {
    let benefit_type: BenefitType = benefit_type.parse()?;

    tracing::info!(
        request_id = %request_id,
        benefit_type = %benefit_type,
        "Listing categories"
    );

    let categories = state
        .recommendations
        .available_categories(benefit_type)
        .await?;

    Ok(Json(assembler::categories_response(
        benefit_type,
        categories,
        Utc::now(),
    )))
}

/// Top cards of each category for a benefit type
pub async fn category_top_cards(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(benefit_type): ApiPath<String>,
    ApiQuery(params): ApiQuery<TopCardsQuery>,
) -> AppResult<Json<CategoryTopCardsResponse>> {
    let benefit_type: BenefitType = benefit_type.parse()?;
    let top_n = state.limits.resolve_top_n(params.top_n)?;

    tracing::info!(
        request_id = %request_id,
        benefit_type = %benefit_type,
        top_n,
        "Processing per-category top cards request"
    );

    let groups = state
        .recommendations
        .top_per_category(benefit_type, top_n)
        .await?;

    Ok(Json(assembler::category_top_cards_response(
        benefit_type,
        top_n,
        groups,
        Utc::now(),
    )))
}

/// Benefit breakdown of one card
pub async fn card_detail(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(card_id): ApiPath<i64>,
) -> AppResult<Json<CardDetailResponse>> {
    tracing::info!(request_id = %request_id, card_id, "Fetching card detail");

    let detail = state.recommendations.card_detail(card_id).await?;
    let response = assembler::card_detail_response(card_id, detail, Utc::now())?;
    Ok(Json(response))
}

/// Every business kind present in the store
pub async fn business_kinds(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<BusinessKindsResponse>> {
    let kinds = state.recommendations.available_business_kinds().await?;
    Ok(Json(assembler::business_kinds_response(kinds, Utc::now())))
}

/// Top five of every category
pub async fn all_top_cards(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<AllTopCardsResponse>> {
    let categories = state.recommendations.all_top_cards().await?;
    Ok(Json(assembler::all_top_cards_response(categories)))
}
