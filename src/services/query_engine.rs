//! Pure shaping of score rows into recommendation results.
//!
//! Functions over rows re-apply their own filter, so the result does not
//! depend on how much the store narrowed the snapshot. Aggregates computed by
//! the store go through the same rounding and ordering as in-memory ones.
//! Scores are rounded on the way out, ordering always uses the raw value.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::{
    db::ScoreFilter,
    models::{
        round_score, BenefitEntry, BenefitType, BenefitTypeSplit, CardCatalog, CardDetail,
        CardRecommendation, CardScore, CategoryGroup, CategoryStats, CategorySummary,
        ScoredBenefit,
    },
};

fn ranked<'a>(
    rows: impl IntoIterator<Item = &'a ScoredBenefit>,
    limit: usize,
    catalog: &dyn CardCatalog,
) -> Vec<CardRecommendation> {
    let mut rows: Vec<&ScoredBenefit> = rows.into_iter().collect();
    rows.sort_by(|a, b| a.score_order(b));
    rows.into_iter()
        .take(limit)
        .map(|row| CardRecommendation::from_row(row, catalog))
        .collect()
}

/// Best cards for a benefit type, optionally inside one category
pub fn top_by_category(
    rows: &[ScoredBenefit],
    benefit_type: BenefitType,
    category: Option<&str>,
    limit: usize,
    catalog: &dyn CardCatalog,
) -> Vec<CardRecommendation> {
    let filter = ScoreFilter::all()
        .benefit_type(benefit_type)
        .category(category.map(str::to_string));
    ranked(rows.iter().filter(|row| filter.matches(row)), limit, catalog)
}

/// Best cards of a business kind, ranked separately for each benefit type
pub fn top_by_business_kind(
    rows: &[ScoredBenefit],
    business_kind: &str,
    limit_per_type: usize,
    catalog: &dyn CardCatalog,
) -> BenefitTypeSplit {
    let kind_filter = ScoreFilter::all().business_kind(business_kind);
    let in_kind: Vec<ScoredBenefit> = rows
        .iter()
        .filter(|row| kind_filter.matches(row))
        .cloned()
        .collect();

    BenefitTypeSplit {
        discount: top_by_category(&in_kind, BenefitType::Discount, None, limit_per_type, catalog),
        cashback: top_by_category(&in_kind, BenefitType::Cashback, None, limit_per_type, catalog),
    }
}

/// Top `top_n` cards of every category under a benefit type
///
/// Groups come back ordered by category name.
pub fn top_per_category(
    rows: &[ScoredBenefit],
    benefit_type: BenefitType,
    top_n: usize,
    catalog: &dyn CardCatalog,
) -> Vec<CategoryGroup> {
    let mut partitions: BTreeMap<&str, Vec<&ScoredBenefit>> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.benefit_type == benefit_type) {
        partitions
            .entry(row.category_name.as_str())
            .or_default()
            .push(row);
    }

    partitions
        .into_iter()
        .map(|(category, members)| CategoryGroup {
            category_name: category.to_string(),
            cards: ranked(members, top_n, catalog),
        })
        .collect()
}

/// Every benefit row of one card, or `None` when the card has no rows
pub fn card_detail(
    rows: &[ScoredBenefit],
    card_id: i64,
    catalog: &dyn CardCatalog,
) -> Option<CardDetail> {
    let mut own: Vec<&ScoredBenefit> = rows.iter().filter(|row| row.card_id == card_id).collect();
    if own.is_empty() {
        return None;
    }

    own.sort_by(|a, b| {
        a.benefit_type
            .cmp(&b.benefit_type)
            .then_with(|| a.category_name.cmp(&b.category_name))
            .then_with(|| a.rank_within_category.cmp(&b.rank_within_category))
    });

    Some(CardDetail {
        card_id,
        info: catalog.lookup(card_id),
        benefits: own.into_iter().map(BenefitEntry::from).collect(),
    })
}

/// Raw per-category aggregates under a benefit type
///
/// The average is taken over rows, the card count over distinct cards.
pub fn category_stats(rows: &[ScoredBenefit], benefit_type: BenefitType) -> Vec<CategoryStats> {
    #[derive(Default)]
    struct Acc {
        cards: HashSet<i64>,
        sum: f64,
        rows: usize,
        max: f64,
    }

    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.benefit_type == benefit_type) {
        let acc = groups
            .entry(row.category_name.as_str())
            .or_insert_with(|| Acc {
                max: f64::NEG_INFINITY,
                ..Acc::default()
            });
        acc.cards.insert(row.card_id);
        acc.sum += row.total_score;
        acc.rows += 1;
        acc.max = acc.max.max(row.total_score);
    }

    groups
        .into_iter()
        .map(|(name, acc)| CategoryStats {
            category_name: name.to_string(),
            card_count: acc.cards.len() as i64,
            avg_score: acc.sum / acc.rows as f64,
            max_score: acc.max,
        })
        .collect()
}

/// Rounds and orders category aggregates
///
/// Ordered by raw average score, then by card count, both descending, then by name.
pub fn summarize_categories(mut stats: Vec<CategoryStats>) -> Vec<CategorySummary> {
    stats.sort_by(|a, b| {
        b.avg_score
            .total_cmp(&a.avg_score)
            .then_with(|| b.card_count.cmp(&a.card_count))
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    stats
        .into_iter()
        .map(|stat| CategorySummary {
            category_name: stat.category_name,
            card_count: usize::try_from(stat.card_count).unwrap_or_default(),
            avg_score: round_score(stat.avg_score),
            max_score: round_score(stat.max_score),
        })
        .collect()
}

/// Sorted distinct business kinds, blanks dropped
pub fn normalize_business_kinds(kinds: impl IntoIterator<Item = String>) -> Vec<String> {
    kinds
        .into_iter()
        .filter(|kind| !kind.trim().is_empty())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Sorted distinct business kinds of a snapshot, blanks and missing values dropped
pub fn available_business_kinds(rows: &[ScoredBenefit]) -> Vec<String> {
    normalize_business_kinds(rows.iter().filter_map(|row| row.business_kind_name.clone()))
}

/// Rows ranked at most `max_rank`, grouped by category name and ordered by rank
pub fn all_top_cards(rows: &[ScoredBenefit], max_rank: i32) -> BTreeMap<String, Vec<CardScore>> {
    let mut categories: BTreeMap<String, Vec<&ScoredBenefit>> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.rank_within_category <= max_rank) {
        categories
            .entry(row.category_name.clone())
            .or_default()
            .push(row);
    }

    categories
        .into_iter()
        .map(|(category, mut members)| {
            members.sort_by(|a, b| {
                a.rank_within_category
                    .cmp(&b.rank_within_category)
                    .then_with(|| a.benefit_type.cmp(&b.benefit_type))
            });
            (category, members.into_iter().map(CardScore::from).collect())
        })
        .collect()
}
