use std::sync::Arc;

use crate::{
    db::ScoreStore,
    models::CardCatalog,
    services::{RecommendationLimits, RecommendationService},
};

/// Version reported by the root and health endpoints
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application state
///
/// Everything in here is immutable after startup, so handlers share it
/// without locking.
#[derive(Clone)]
pub struct AppState {
    pub recommendations: RecommendationService,
    pub limits: RecommendationLimits,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        catalog: Arc<dyn CardCatalog>,
        limits: RecommendationLimits,
    ) -> Self {
        Self {
            recommendations: RecommendationService::new(store, catalog),
            limits,
        }
    }
}
