use std::{future::Future, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{BenefitType, CategoryStats, ScoredBenefit},
};

use super::{ScoreFilter, ScoreStore};

/// Table written by the scoring batch job
pub const SCORES_TABLE: &str = "solomon.card_category_scores";

const SELECT_COLUMNS: &str = "SELECT \
    card_id::int8 AS card_id, \
    profit_id::int8 AS profit_id, \
    kind_name, \
    benefit_type, \
    kind_name_rank::int4 AS kind_name_rank, \
    total_score::float8 AS total_score, \
    benefit_value_score::float8 AS benefit_value_score, \
    convenience_score::float8 AS convenience_score, \
    accessibility_score::float8 AS accessibility_score, \
    category_group_name, \
    business_kind_name, \
    benefit_subtype_name";

/// Matches `ScoredBenefit::score_order`
const SCORE_ORDER: &str = "total_score DESC, kind_name_rank ASC, card_id ASC";

/// Creates a PostgreSQL connection pool
///
/// Keeps `DATABASE_POOL_SIZE` connections warm and allows up to
/// `DATABASE_MAX_OVERFLOW` more under load. Connections are tested before
/// they are handed out.
pub async fn create_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .min_connections(config.database_pool_size)
        .max_connections(config.max_connections())
        .acquire_timeout(config.query_timeout())
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await?;

    Ok(pool)
}

/// Raw row as returned by Postgres
#[derive(Debug, sqlx::FromRow)]
struct ScoreRow {
    card_id: i64,
    profit_id: i64,
    kind_name: String,
    benefit_type: String,
    kind_name_rank: i32,
    total_score: f64,
    benefit_value_score: Option<f64>,
    convenience_score: Option<f64>,
    accessibility_score: Option<f64>,
    category_group_name: Option<String>,
    business_kind_name: Option<String>,
    benefit_subtype_name: Option<String>,
}

impl TryFrom<ScoreRow> for ScoredBenefit {
    type Error = AppError;

    fn try_from(row: ScoreRow) -> Result<Self, Self::Error> {
        let benefit_type: BenefitType = row.benefit_type.parse().map_err(|_| {
            AppError::Internal(format!(
                "Unrecognized benefit_type '{}' for card {}",
                row.benefit_type, row.card_id
            ))
        })?;

        Ok(ScoredBenefit {
            card_id: row.card_id,
            profit_id: row.profit_id,
            category_name: row.kind_name,
            benefit_type,
            rank_within_category: row.kind_name_rank,
            total_score: row.total_score,
            benefit_value_score: row.benefit_value_score,
            convenience_score: row.convenience_score,
            accessibility_score: row.accessibility_score,
            category_group_name: row.category_group_name,
            business_kind_name: row.business_kind_name,
            benefit_subtype_name: row.benefit_subtype_name,
        })
    }
}

/// Score store backed by the batch job's Postgres table
#[derive(Clone)]
pub struct PgScoreStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgScoreStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    fn push_filters(query: &mut QueryBuilder<'static, Postgres>, filter: &ScoreFilter) {
        query.push(" FROM ").push(SCORES_TABLE).push(" WHERE 1 = 1");

        if let Some(benefit_type) = filter.benefit_type {
            query
                .push(" AND UPPER(benefit_type) = ")
                .push_bind(benefit_type.as_str());
        }
        if let Some(category) = &filter.category {
            query.push(" AND kind_name = ").push_bind(category.clone());
        }
        if let Some(kind) = &filter.business_kind {
            query.push(" AND business_kind_name = ").push_bind(kind.clone());
        }
        if let Some(card_id) = filter.card_id {
            query.push(" AND card_id = ").push_bind(card_id);
        }
        if let Some(max_rank) = filter.max_rank {
            query.push(" AND kind_name_rank <= ").push_bind(max_rank);
        }
    }

    fn build_query(filter: &ScoreFilter) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(SELECT_COLUMNS);

        match filter.per_category_limit {
            Some(per_category) => {
                query
                    .push(" FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY kind_name, benefit_type ORDER BY ")
                    .push(SCORE_ORDER)
                    .push(") AS category_position");
                Self::push_filters(&mut query, filter);
                query
                    .push(") AS ranked WHERE category_position <= ")
                    .push_bind(i64::from(per_category));
            }
            None => Self::push_filters(&mut query, filter),
        }

        match filter.limit {
            Some(limit) => {
                query
                    .push(" ORDER BY ")
                    .push(SCORE_ORDER)
                    .push(" LIMIT ")
                    .push_bind(i64::from(limit));
            }
            None => {
                query.push(" ORDER BY kind_name, benefit_type, kind_name_rank");
            }
        }
        query
    }

    fn business_kinds_query() -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new("SELECT DISTINCT business_kind_name FROM ");
        query.push(SCORES_TABLE).push(
            " WHERE business_kind_name IS NOT NULL AND TRIM(business_kind_name) <> '' \
             ORDER BY business_kind_name",
        );
        query
    }

    fn category_stats_query(benefit_type: BenefitType) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(
            "SELECT kind_name AS category_name, \
             COUNT(DISTINCT card_id)::int8 AS card_count, \
             AVG(total_score)::float8 AS avg_score, \
             MAX(total_score)::float8 AS max_score FROM ",
        );
        query
            .push(SCORES_TABLE)
            .push(" WHERE UPPER(benefit_type) = ")
            .push_bind(benefit_type.as_str())
            .push(" GROUP BY kind_name");
        query
    }

    /// Runs a query under the store timeout, logging failures
    async fn timed<T, F>(&self, operation: &'static str, query: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| {
                tracing::error!(operation, timeout = ?self.timeout, "Score query timed out");
                AppError::StoreTimeout(self.timeout)
            })?
            .map_err(|e| {
                tracing::error!(error = %e, operation, "Score query failed");
                AppError::Database(e)
            })
    }
}

#[async_trait::async_trait]
impl ScoreStore for PgScoreStore {
    async fn fetch(&self, filter: &ScoreFilter) -> AppResult<Vec<ScoredBenefit>> {
        let mut query = Self::build_query(filter);
        let rows: Vec<ScoreRow> = self
            .timed("fetch", query.build_query_as::<ScoreRow>().fetch_all(&self.pool))
            .await?;

        tracing::debug!(filter = ?filter, rows = rows.len(), "Fetched score rows");

        rows.into_iter().map(ScoredBenefit::try_from).collect()
    }

    async fn business_kinds(&self) -> AppResult<Vec<String>> {
        let mut query = Self::business_kinds_query();
        self.timed(
            "business_kinds",
            query.build_query_scalar::<String>().fetch_all(&self.pool),
        )
        .await
    }

    async fn category_stats(&self, benefit_type: BenefitType) -> AppResult<Vec<CategoryStats>> {
        let mut query = Self::category_stats_query(benefit_type);
        self.timed(
            "category_stats",
            query.build_query_as::<CategoryStats>().fetch_all(&self.pool),
        )
        .await
    }

    async fn ping(&self) -> AppResult<()> {
        self.timed("ping", sqlx::query("SELECT 1").execute(&self.pool))
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
