use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    middleware::{
        make_span_with_request_id, request_id_middleware, trusted_host_middleware, TrustedHosts,
    },
};

use super::{handlers, health, AppState};

/// Router-level settings taken from `Config`
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub api_prefix: String,
    pub allowed_hosts: Vec<String>,
    pub allowed_origins: Vec<String>,
}

impl RouterOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_prefix: config.api_prefix.trim_end_matches('/').to_string(),
            allowed_hosts: config.allowed_hosts_list(),
            allowed_origins: config.allowed_origins_list(),
        }
    }

    /// Accept any host and origin under the default prefix
    pub fn permissive() -> Self {
        Self {
            api_prefix: "/api/v1".to_string(),
            allowed_hosts: vec!["*".to_string()],
            allowed_origins: vec!["*".to_string()],
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request());

    if origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins).allow_credentials(true)
}

/// Recommendation routes under `{prefix}/card-recommendation`
fn recommendation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/top5", get(handlers::all_top_cards))
        .route("/kinds", get(handlers::business_kinds))
        .route("/recommend/:benefit_type", get(handlers::recommend))
        .route("/categories/:benefit_type", get(handlers::categories))
        .route(
            "/categories/:benefit_type/top-cards",
            get(handlers::category_top_cards),
        )
        .route("/card/:card_id", get(handlers::card_detail))
        .route("/kinds/:business_kind_name", get(handlers::business_kind))
        // Shorthand for the route above. Static segments win, so a kind named
        // `top5` or `kinds` is only reachable through `/kinds/{name}`.
        .route("/:business_kind_name", get(handlers::business_kind))
}

/// Health routes under `{prefix}/health`
fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/live", get(health::liveness_check))
}

/// Creates the main API router with all routes and middleware
pub fn create_router(state: AppState, options: &RouterOptions) -> Router {
    let trusted_hosts = Arc::new(TrustedHosts::new(options.allowed_hosts.clone()));

    Router::new()
        .route("/", get(health::root))
        .nest(&format!("{}/health", options.api_prefix), health_routes())
        .nest(
            &format!("{}/card-recommendation", options.api_prefix),
            recommendation_routes(),
        )
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&options.allowed_origins))
                .layer(middleware::from_fn_with_state(
                    trusted_hosts,
                    trusted_host_middleware,
                ))
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}
