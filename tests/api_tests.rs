use std::sync::Arc;

use axum::http::{header::HOST, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::Value;

use card_recommendation_api::{
    api::{create_router, AppState, RouterOptions},
    db::{InMemoryScoreStore, ScoreFilter, ScoreStore},
    error::{AppError, AppResult},
    models::{BenefitType, CategoryStats, PlaceholderCardCatalog, ScoredBenefit},
    services::RecommendationLimits,
};

const PREFIX: &str = "/api/v1/card-recommendation";
// 편의점
const CONVENIENCE_KIND: &str = "%ED%8E%B8%EC%9D%98%EC%A0%90";
// 마트
const MART_KIND: &str = "%EB%A7%88%ED%8A%B8";
// 주유소
const GAS_KIND: &str = "%EC%A3%BC%EC%9C%A0%EC%86%8C";

const LIMITS: RecommendationLimits = RecommendationLimits {
    default_limit: 10,
    max_limit: 20,
};

fn scored(
    card_id: i64,
    category: &str,
    benefit_type: BenefitType,
    rank: i32,
    score: f64,
    kind: Option<&str>,
) -> ScoredBenefit {
    ScoredBenefit {
        card_id,
        profit_id: 1000 + card_id,
        category_name: category.to_string(),
        benefit_type,
        rank_within_category: rank,
        total_score: score,
        benefit_value_score: Some(0.5),
        convenience_score: Some(0.25),
        accessibility_score: None,
        category_group_name: Some("생활".to_string()),
        business_kind_name: kind.map(str::to_string),
        benefit_subtype_name: None,
    }
}

fn fixture_rows() -> Vec<ScoredBenefit> {
    use BenefitType::*;
    vec![
        scored(1, "convenience_store", Discount, 1, 0.9, Some("편의점")),
        scored(2, "convenience_store", Discount, 2, 0.7, Some("편의점")),
        scored(3, "convenience_store", Discount, 3, 0.7, Some("편의점")),
        scored(4, "mart", Discount, 1, 0.812345, Some("마트")),
        scored(5, "mart", Cashback, 1, 0.66, Some("마트")),
        scored(1, "mart", Cashback, 2, 0.5, Some("마트")),
        scored(6, "online", Cashback, 1, 0.3, Some("")),
        scored(7, "etc", Discount, 1, 0.2, None),
    ]
}

fn server_with(store: Arc<dyn ScoreStore>, options: RouterOptions) -> TestServer {
    let state = AppState::new(store, Arc::new(PlaceholderCardCatalog), LIMITS);
    TestServer::new(create_router(state, &options)).unwrap()
}

fn create_test_server() -> TestServer {
    server_with(
        Arc::new(InMemoryScoreStore::new(fixture_rows())),
        RouterOptions::permissive(),
    )
}

/// Store whose every call fails
struct BrokenStore;

#[async_trait::async_trait]
impl ScoreStore for BrokenStore {
    async fn fetch(&self, _filter: &ScoreFilter) -> AppResult<Vec<ScoredBenefit>> {
        Err(AppError::Database(sqlx::Error::PoolClosed))
    }

    async fn business_kinds(&self) -> AppResult<Vec<String>> {
        Err(AppError::Database(sqlx::Error::PoolClosed))
    }

    async fn category_stats(&self, _benefit_type: BenefitType) -> AppResult<Vec<CategoryStats>> {
        Err(AppError::Database(sqlx::Error::PoolClosed))
    }

    async fn ping(&self) -> AppResult<()> {
        Err(AppError::Database(sqlx::Error::PoolClosed))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn test_root() {
    let server = create_test_server();
    let response = server.get("/").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Card Recommendation API");
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = create_test_server();

    let response = server.get("/api/v1/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database_connected"], true);

    let body: Value = server.get("/api/v1/health/ready").await.json();
    assert_eq!(body["status"], "ready");

    let body: Value = server.get("/api/v1/health/live").await.json();
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_health_reports_unreachable_store() {
    let server = server_with(Arc::new(BrokenStore), RouterOptions::permissive());
    let response = server.get("/api/v1/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database_connected"], false);
}

#[tokio::test]
async fn test_recommend_by_category() {
    let server = create_test_server();
    let response = server
        .get(&format!("{}/recommend/discount", PREFIX))
        .add_query_param("category", "convenience_store")
        .add_query_param("limit", 2)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["benefit_type"], "DISCOUNT");
    assert_eq!(body["category"], "convenience_store");
    assert_eq!(body["total_count"], 2);

    let cards = body["recommendations"].as_array().unwrap();
    assert_eq!(cards[0]["card_id"], 1);
    assert_eq!(cards[0]["card_name"], "Card 1");
    assert_eq!(cards[1]["card_id"], 2);
    assert_eq!(cards[1]["rank_within_category"], 2);
}

#[tokio::test]
async fn test_recommend_rounds_scores_and_uses_default_limit() {
    let server = create_test_server();
    let response = server.get(&format!("{}/recommend/DISCOUNT", PREFIX)).await;

    response.assert_status_ok();
    let body: Value = response.json();
    let cards = body["recommendations"].as_array().unwrap();
    assert_eq!(cards.len(), 5);
    assert_eq!(cards[0]["card_id"], 1);
    assert_eq!(cards[1]["card_id"], 4);
    assert_eq!(cards[1]["total_score"], 0.8123);
    assert!(body["category"].is_null());
}

#[tokio::test]
async fn test_recommend_unknown_category_is_empty() {
    let server = create_test_server();
    let response = server
        .get(&format!("{}/recommend/cashback", PREFIX))
        .add_query_param("category", "airline")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total_count"], 0);
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_recommend_rejects_out_of_range_limit() {
    let server = create_test_server();

    let response = server
        .get(&format!("{}/recommend/discount", PREFIX))
        .add_query_param("limit", 0)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("limit"));

    let response = server
        .get(&format!("{}/recommend/discount", PREFIX))
        .add_query_param("limit", 21)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommend_rejects_unknown_benefit_type() {
    let server = create_test_server();
    let response = server.get(&format!("{}/recommend/points", PREFIX)).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_business_kind_with_both_types() {
    let server = create_test_server();
    let response = server.get(&format!("{}/{}", PREFIX, MART_KIND)).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["business_kind_name"], "마트");
    assert_eq!(body["discount"]["count"], 1);
    assert_eq!(body["cashback"]["count"], 2);
    assert_eq!(body["cashback"]["cards"][0]["card_id"], 5);
    assert_eq!(body["total_count"], 3);
}

#[tokio::test]
async fn test_business_kind_synthesizes_missing_type() {
    let server = create_test_server();
    let response = server
        .get(&format!("{}/{}", PREFIX, CONVENIENCE_KIND))
        .add_query_param("limit", 2)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["discount"]["count"], 2);
    assert_eq!(body["cashback"]["count"], 0);
    assert_eq!(body["cashback"]["benefit_type"], "CASHBACK");
    assert_eq!(body["cashback"]["cards"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_business_kind_without_rows_is_not_found() {
    let server = create_test_server();
    let response = server.get(&format!("{}/{}", PREFIX, GAS_KIND)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("주유소"));
}

#[tokio::test]
async fn test_business_kind_named_like_static_route() {
    let mut rows = fixture_rows();
    rows.push(scored(8, "pop_up", BenefitType::Discount, 1, 0.4, Some("top5")));
    rows.push(scored(9, "pop_up", BenefitType::Cashback, 1, 0.3, Some("kinds")));
    let server = server_with(
        Arc::new(InMemoryScoreStore::new(rows)),
        RouterOptions::permissive(),
    );

    let response = server.get(&format!("{}/kinds/top5", PREFIX)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["business_kind_name"], "top5");
    assert_eq!(body["discount"]["cards"][0]["card_id"], 8);

    let response = server.get(&format!("{}/kinds/kinds", PREFIX)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["cashback"]["cards"][0]["card_id"], 9);

    // The shorthand and the explicit route agree
    let short: Value = server.get(&format!("{}/{}", PREFIX, MART_KIND)).await.json();
    let long: Value = server
        .get(&format!("{}/kinds/{}", PREFIX, MART_KIND))
        .await
        .json();
    assert_eq!(short["discount"], long["discount"]);
    assert_eq!(short["cashback"], long["cashback"]);
}

#[tokio::test]
async fn test_malformed_parameters_return_json_errors() {
    let server = create_test_server();

    let response = server
        .get(&format!("{}/recommend/discount?limit=abc", PREFIX))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());

    let response = server
        .get(&format!("{}/categories/discount/top-cards?top_n=-1", PREFIX))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());

    let response = server.get(&format!("{}/card/abc", PREFIX)).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_categories() {
    let server = create_test_server();
    let response = server.get(&format!("{}/categories/discount", PREFIX)).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total_count"], 3);

    let categories = body["categories"].as_array().unwrap();
    let names: Vec<&str> = categories
        .iter()
        .map(|c| c["category_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["mart", "convenience_store", "etc"]);
    assert_eq!(categories[1]["card_count"], 3);
    assert_eq!(categories[1]["max_score"], 0.9);
    let avg = categories[1]["avg_score"].as_f64().unwrap();
    assert!((avg - (0.9 + 0.7 + 0.7) / 3.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_category_top_cards() {
    let server = create_test_server();
    let response = server
        .get(&format!("{}/categories/cashback/top-cards", PREFIX))
        .add_query_param("top_n", 1)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["top_n"], 1);
    assert_eq!(body["total_categories"], 2);

    let groups = body["categories"].as_array().unwrap();
    assert_eq!(groups[0]["category_name"], "mart");
    assert_eq!(groups[0]["cards"].as_array().unwrap().len(), 1);
    assert_eq!(groups[0]["cards"][0]["card_id"], 5);
    assert_eq!(groups[1]["category_name"], "online");
}

#[tokio::test]
async fn test_card_detail() {
    let server = create_test_server();
    let response = server.get(&format!("{}/card/1", PREFIX)).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["card_id"], 1);
    assert_eq!(body["card_name"], "Card 1");
    assert_eq!(body["annual_fee"], 0);
    assert_eq!(body["total_benefits"], 2);
    assert_eq!(body["benefits"].as_array().unwrap().len(), 2);
    assert_eq!(body["benefits"][0]["score_breakdown"]["convenience_score"], 0.25);
}

#[tokio::test]
async fn test_card_detail_not_found() {
    let server = create_test_server();
    let response = server.get(&format!("{}/card/999", PREFIX)).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_business_kinds() {
    let server = create_test_server();
    let response = server.get(&format!("{}/kinds", PREFIX)).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["business_kinds"], serde_json::json!(["마트", "편의점"]));
    assert_eq!(body["total_count"], 2);
}

#[tokio::test]
async fn test_top5() {
    let server = create_test_server();
    let response = server.get(&format!("{}/top5", PREFIX)).await;

    response.assert_status_ok();
    let body: Value = response.json();
    let categories = body["categories"].as_object().unwrap();
    assert_eq!(categories.len(), 4);
    assert_eq!(categories["convenience_store"].as_array().unwrap().len(), 3);
    assert_eq!(categories["convenience_store"][0]["kind_name_rank"], 1);
    assert_eq!(categories["mart"][0]["kind_name"], "mart");
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let server = server_with(Arc::new(BrokenStore), RouterOptions::permissive());
    let response = server.get(&format!("{}/kinds", PREFIX)).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let response = server
        .get(&format!("{}/kinds", PREFIX))
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-42"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), "trace-42");
}

#[tokio::test]
async fn test_untrusted_host_is_rejected() {
    let options = RouterOptions {
        allowed_hosts: vec!["api.example.com".to_string()],
        ..RouterOptions::permissive()
    };
    let server = server_with(Arc::new(InMemoryScoreStore::new(fixture_rows())), options);

    let response = server
        .get("/api/v1/health/live")
        .add_header(HOST, HeaderValue::from_static("evil.com"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/v1/health/live")
        .add_header(HOST, HeaderValue::from_static("api.example.com:8000"))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let server = create_test_server();
    let path = format!("{}/categories/discount/top-cards", PREFIX);

    let first: Value = server.get(&path).await.json();
    let second: Value = server.get(&path).await.json();
    assert_eq!(first["categories"], second["categories"]);
}
