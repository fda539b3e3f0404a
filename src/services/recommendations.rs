use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::{ScoreFilter, ScoreStore},
    error::AppResult,
    models::{
        BenefitType, BenefitTypeSplit, CardCatalog, CardDetail, CardRecommendation, CardScore,
        CategoryGroup, CategorySummary,
    },
    services::query_engine,
};

/// Rank cutoff for the all-categories top list
pub const ALL_TOP_MAX_RANK: i32 = 5;

/// Runs recommendation queries against the score store
///
/// Holds no per-request state; one instance is shared by every handler. Each
/// call pushes its filters and row caps down to the store, so only the rows a
/// response needs are read, then hands them to the query engine.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn ScoreStore>,
    catalog: Arc<dyn CardCatalog>,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn ScoreStore>, catalog: Arc<dyn CardCatalog>) -> Self {
        Self { store, catalog }
    }

    #[instrument(skip(self))]
    pub async fn top_by_category(
        &self,
        benefit_type: BenefitType,
        category: Option<String>,
        limit: u32,
    ) -> AppResult<Vec<CardRecommendation>> {
        let filter = ScoreFilter::all()
            .benefit_type(benefit_type)
            .category(category.clone())
            .limit(limit);
        let rows = self.store.fetch(&filter).await?;

        Ok(query_engine::top_by_category(
            &rows,
            benefit_type,
            category.as_deref(),
            limit as usize,
            self.catalog.as_ref(),
        ))
    }

    #[instrument(skip(self))]
    pub async fn top_by_business_kind(
        &self,
        business_kind: &str,
        limit_per_type: u32,
    ) -> AppResult<BenefitTypeSplit> {
        let mut rows = Vec::new();
        for benefit_type in BenefitType::ALL {
            let filter = ScoreFilter::all()
                .business_kind(business_kind)
                .benefit_type(benefit_type)
                .limit(limit_per_type);
            rows.extend(self.store.fetch(&filter).await?);
        }

        let split = query_engine::top_by_business_kind(
            &rows,
            business_kind,
            limit_per_type as usize,
            self.catalog.as_ref(),
        );

        tracing::debug!(
            discount = split.discount.len(),
            cashback = split.cashback.len(),
            "Business kind recommendations ranked"
        );

        Ok(split)
    }

    #[instrument(skip(self))]
    pub async fn top_per_category(
        &self,
        benefit_type: BenefitType,
        top_n: u32,
    ) -> AppResult<Vec<CategoryGroup>> {
        let filter = ScoreFilter::all()
            .benefit_type(benefit_type)
            .per_category_limit(top_n);
        let rows = self.store.fetch(&filter).await?;

        Ok(query_engine::top_per_category(
            &rows,
            benefit_type,
            top_n as usize,
            self.catalog.as_ref(),
        ))
    }

    #[instrument(skip(self))]
    pub async fn card_detail(&self, card_id: i64) -> AppResult<Option<CardDetail>> {
        let rows = self.store.fetch(&ScoreFilter::all().card_id(card_id)).await?;
        Ok(query_engine::card_detail(&rows, card_id, self.catalog.as_ref()))
    }

    #[instrument(skip(self))]
    pub async fn available_categories(
        &self,
        benefit_type: BenefitType,
    ) -> AppResult<Vec<CategorySummary>> {
        let stats = self.store.category_stats(benefit_type).await?;
        Ok(query_engine::summarize_categories(stats))
    }

    #[instrument(skip(self))]
    pub async fn available_business_kinds(&self) -> AppResult<Vec<String>> {
        let kinds = self.store.business_kinds().await?;
        Ok(query_engine::normalize_business_kinds(kinds))
    }

    #[instrument(skip(self))]
    pub async fn all_top_cards(&self) -> AppResult<BTreeMap<String, Vec<CardScore>>> {
        let rows = self
            .store
            .fetch(&ScoreFilter::all().max_rank(ALL_TOP_MAX_RANK))
            .await?;
        Ok(query_engine::all_top_cards(&rows, ALL_TOP_MAX_RANK))
    }

    /// Whether the store answers a round-trip query
    pub async fn store_reachable(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Score store health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MockScoreStore,
        error::AppError,
        models::{CategoryStats, PlaceholderCardCatalog, ScoredBenefit},
    };

    fn service(store: MockScoreStore) -> RecommendationService {
        RecommendationService::new(Arc::new(store), Arc::new(PlaceholderCardCatalog))
    }

    #[tokio::test]
    async fn test_top_by_category_pushes_filter_to_store() {
        let mut store = MockScoreStore::new();
        store
            .expect_fetch()
            .withf(|filter| {
                filter.benefit_type == Some(BenefitType::Discount)
                    && filter.category.as_deref() == Some("convenience_store")
                    && filter.limit == Some(2)
            })
            .times(1)
            .returning(|_| {
                Ok(vec![
                    ScoredBenefit::sample(1, "convenience_store", BenefitType::Discount, 1, 0.9),
                    ScoredBenefit::sample(2, "convenience_store", BenefitType::Discount, 2, 0.7),
                    ScoredBenefit::sample(3, "convenience_store", BenefitType::Discount, 3, 0.7),
                ])
            });

        let result = service(store)
            .top_by_category(
                BenefitType::Discount,
                Some("convenience_store".to_string()),
                2,
            )
            .await
            .unwrap();

        let ids: Vec<i64> = result.iter().map(|r| r.card_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockScoreStore::new();
        store
            .expect_business_kinds()
            .returning(|| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let result = service(store).available_business_kinds().await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_business_kind_fetches_each_type_with_limit() {
        let mut store = MockScoreStore::new();
        store
            .expect_fetch()
            .withf(|filter| {
                filter.business_kind.as_deref() == Some("마트")
                    && filter.benefit_type == Some(BenefitType::Discount)
                    && filter.limit == Some(3)
            })
            .times(1)
            .returning(|_| {
                Ok(vec![ScoredBenefit::sample(1, "마트", BenefitType::Discount, 1, 0.9)
                    .with_business_kind(Some("마트"))])
            });
        store
            .expect_fetch()
            .withf(|filter| {
                filter.business_kind.as_deref() == Some("마트")
                    && filter.benefit_type == Some(BenefitType::Cashback)
                    && filter.limit == Some(3)
            })
            .times(1)
            .returning(|_| Ok(vec![]));

        let split = service(store).top_by_business_kind("마트", 3).await.unwrap();
        assert_eq!(split.discount.len(), 1);
        assert!(split.cashback.is_empty());
    }

    #[tokio::test]
    async fn test_top_per_category_pushes_cutoff_to_store() {
        let mut store = MockScoreStore::new();
        store
            .expect_fetch()
            .withf(|filter| {
                filter.benefit_type == Some(BenefitType::Cashback)
                    && filter.per_category_limit == Some(2)
                    && filter.limit.is_none()
            })
            .times(1)
            .returning(|_| {
                Ok(vec![
                    ScoredBenefit::sample(1, "cafe", BenefitType::Cashback, 1, 0.9),
                    ScoredBenefit::sample(2, "mart", BenefitType::Cashback, 1, 0.8),
                ])
            });

        let groups = service(store)
            .top_per_category(BenefitType::Cashback, 2)
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[tokio::test]
    async fn test_available_categories_uses_store_aggregates() {
        let mut store = MockScoreStore::new();
        store.expect_fetch().never();
        store
            .expect_category_stats()
            .withf(|bt| *bt == BenefitType::Discount)
            .times(1)
            .returning(|_| {
                Ok(vec![
                    CategoryStats {
                        category_name: "mart".to_string(),
                        card_count: 2,
                        avg_score: 0.4,
                        max_score: 0.5,
                    },
                    CategoryStats {
                        category_name: "cafe".to_string(),
                        card_count: 4,
                        avg_score: 0.712345,
                        max_score: 0.9,
                    },
                ])
            });

        let summaries = service(store)
            .available_categories(BenefitType::Discount)
            .await
            .unwrap();
        assert_eq!(summaries[0].category_name, "cafe");
        assert_eq!(summaries[0].avg_score, 0.7123);
        assert_eq!(summaries[1].card_count, 2);
    }

    #[tokio::test]
    async fn test_available_business_kinds_are_sorted() {
        let mut store = MockScoreStore::new();
        store.expect_fetch().never();
        store
            .expect_business_kinds()
            .returning(|| Ok(vec!["주유소".to_string(), "마트".to_string()]));

        let kinds = service(store).available_business_kinds().await.unwrap();
        assert_eq!(kinds, vec!["마트", "주유소"]);
    }

    #[tokio::test]
    async fn test_card_detail_not_found_is_none() {
        let mut store = MockScoreStore::new();
        store
            .expect_fetch()
            .withf(|filter| filter.card_id == Some(999))
            .returning(|_| Ok(vec![]));

        let detail = service(store).card_detail(999).await.unwrap();
        assert!(detail.is_none());
    }

    #[tokio::test]
    async fn test_all_top_cards_requests_rank_cutoff() {
        let mut store = MockScoreStore::new();
        store
            .expect_fetch()
            .withf(|filter| filter.max_rank == Some(ALL_TOP_MAX_RANK))
            .returning(|_| {
                Ok(vec![ScoredBenefit::sample(
                    1,
                    "cafe",
                    BenefitType::Cashback,
                    1,
                    0.5,
                )])
            });

        let categories = service(store).all_top_cards().await.unwrap();
        assert_eq!(categories["cafe"].len(), 1);
    }

    #[tokio::test]
    async fn test_store_reachable_reports_ping_failure() {
        let mut store = MockScoreStore::new();
        store
            .expect_ping()
            .returning(|| Err(AppError::Database(sqlx::Error::PoolClosed)));

        assert!(!service(store).store_reachable().await);
    }
}
