//! Relevance scoring and result ordering.
//!
//! The score is a weighted composite of four components: text match (40),
//! rating (30), popularity (15) and distance (15). An unknown distance
//! contributes the neutral midpoint of its component instead of failing
//! the calculation, so searches without a location still rank sensibly.

use std::cmp::Ordering;

use crate::models::{Business, MatchField, SearchResult, SortBy, SortOrder};

const TEXT_WEIGHT: f64 = 40.0;
const RATING_WEIGHT: f64 = 30.0;
const POPULARITY_WEIGHT: f64 = 15.0;
const DISTANCE_WEIGHT: f64 = 15.0;

/// Tunable caps for the normalized components.
#[derive(Debug, Clone, Copy)]
pub struct RankingConfig {
    /// Review count at which the popularity component saturates.
    pub review_count_cap: f64,
    /// Distance at which the distance component decays to zero.
    pub distance_cap_m: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            review_count_cap: 100.0,
            distance_cap_m: 10_000.0,
        }
    }
}

fn field_value(business: &Business, field: MatchField) -> &str {
    match field {
        MatchField::Name => &business.name,
        MatchField::Description => &business.description,
        MatchField::Category => &business.category,
        MatchField::Address => &business.address,
    }
}

/// Composite relevance score, clamped into `[0, 100]`.
#[must_use]
pub fn score(
    business: &Business,
    query: &str,
    distance_m: Option<f64>,
    config: &RankingConfig,
) -> f64 {
    let query = query.trim().to_lowercase();

    let mut text_points = 0.0;
    if !query.is_empty() {
        for field in MatchField::ALL {
            let value = field_value(business, field).to_lowercase();
            if value.is_empty() {
                continue;
            }
            let weight = field.weight();
            if value == query {
                text_points += weight * 3.0;
            } else if value.starts_with(&query) {
                text_points += weight * 2.0;
            } else if value.contains(&query) {
                text_points += weight;
            }
        }
    }
    let text = text_points / 10.0 * TEXT_WEIGHT;

    let rating = (business.average_rating / 5.0) * RATING_WEIGHT;

    let popularity =
        (f64::from(business.review_count) / config.review_count_cap).min(1.0) * POPULARITY_WEIGHT;

    let distance = distance_m.map_or(DISTANCE_WEIGHT / 2.0, |d| {
        ((config.distance_cap_m - d) / config.distance_cap_m).max(0.0) * DISTANCE_WEIGHT
    });

    (text + rating + popularity + distance).clamp(0.0, 100.0)
}

/// Fields whose value contains the query, case-insensitively.
#[must_use]
pub fn matched_fields(business: &Business, query: &str) -> Vec<MatchField> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    MatchField::ALL
        .into_iter()
        .filter(|&field| {
            field_value(business, field)
                .to_lowercase()
                .contains(&query)
        })
        .collect()
}

fn compare(a: &SearchResult, b: &SearchResult, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Distance => {
            let da = a.distance_m.unwrap_or(f64::INFINITY);
            let db = b.distance_m.unwrap_or(f64::INFINITY);
            da.total_cmp(&db)
        }
        SortBy::Rating => a.average_rating().total_cmp(&b.average_rating()),
        SortBy::Popularity => a.review_count().cmp(&b.review_count()),
        SortBy::Newest => a.business.created_at.cmp(&b.business.created_at),
        SortBy::Relevance => a.relevance_score.total_cmp(&b.relevance_score),
    }
}

/// Orders results in place. Comparators are ascending in their key;
/// `SortOrder::Desc` reverses.
pub fn sort_results(results: &mut [SearchResult], sort_by: SortBy, sort_order: SortOrder) {
    results.sort_by(|a, b| {
        let ordering = compare(a, b, sort_by);
        match sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusinessId, Coordinates};
    use chrono::{TimeZone, Utc};

    fn business(name: &str, rating: f64, reviews: u32) -> Business {
        Business {
            id: BusinessId::new(name),
            name: name.to_string(),
            description: String::new(),
            category: String::new(),
            address: String::new(),
            location: Some(Coordinates::new(52.52, 13.405)),
            average_rating: rating,
            review_count: reviews,
            price_level: None,
            is_open: true,
            has_delivery: false,
            has_parking: false,
            accepts_cards: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn result(name: &str, rating: f64, reviews: u32, distance_m: Option<f64>) -> SearchResult {
        let b = business(name, rating, reviews);
        let s = score(&b, name, distance_m, &RankingConfig::default());
        SearchResult {
            business: b,
            distance_m,
            relevance_score: s,
            matched_fields: Vec::new(),
        }
    }

    #[test]
    fn score_stays_within_bounds() {
        let config = RankingConfig::default();
        let mut exact = business("Pipe Dreams Plumbing", 5.0, 500);
        exact.description = "Pipe Dreams Plumbing".to_string();
        exact.category = "Pipe Dreams Plumbing".to_string();
        exact.address = "Pipe Dreams Plumbing".to_string();

        let top = score(&exact, "pipe dreams plumbing", Some(0.0), &config);
        assert!(top <= 100.0, "got {top}");

        let bottom = score(&business("zzz", 0.0, 0), "plumber", Some(50_000.0), &config);
        assert!(bottom >= 0.0);
    }

    #[test]
    fn exact_match_outranks_prefix_and_substring() {
        let config = RankingConfig::default();
        let exact = score(&business("Plumber", 3.0, 10), "plumber", None, &config);
        let prefix = score(&business("Plumber Pro", 3.0, 10), "plumber", None, &config);
        let substr = score(&business("Best Plumber", 3.0, 10), "plumber", None, &config);
        let none = score(&business("Bakery", 3.0, 10), "plumber", None, &config);

        assert!(exact > prefix);
        assert!(prefix > substr);
        assert!(substr > none);
    }

    #[test]
    fn unknown_distance_scores_neutral_midpoint() {
        let config = RankingConfig::default();
        let b = business("Cafe", 0.0, 0);

        let unknown = score(&b, "", None, &config);
        let near = score(&b, "", Some(0.0), &config);
        let far = score(&b, "", Some(20_000.0), &config);

        assert!((unknown - 7.5).abs() < 1e-9);
        assert!((near - 15.0).abs() < 1e-9);
        assert!(far.abs() < 1e-9);
    }

    #[test]
    fn distance_cap_is_configurable() {
        let config = RankingConfig {
            review_count_cap: 100.0,
            distance_cap_m: 2_000.0,
        };
        let b = business("Cafe", 0.0, 0);
        // Beyond the tightened cap the component bottoms out.
        assert!(score(&b, "", Some(3_000.0), &config).abs() < 1e-9);
    }

    #[test]
    fn matched_fields_are_case_insensitive() {
        let mut b = business("Brew Lab", 4.0, 20);
        b.description = "Small-batch COFFEE roastery".to_string();
        b.category = "Coffee Shop".to_string();

        let fields = matched_fields(&b, "coffee");
        assert_eq!(fields, vec![MatchField::Description, MatchField::Category]);
        assert!(matched_fields(&b, "").is_empty());
    }

    #[test]
    fn rating_desc_is_non_increasing() {
        let mut results = vec![
            result("a", 3.0, 5, None),
            result("b", 4.8, 5, None),
            result("c", 1.2, 5, None),
        ];
        sort_results(&mut results, SortBy::Rating, SortOrder::Desc);

        let ratings: Vec<f64> = results.iter().map(SearchResult::average_rating).collect();
        assert!(ratings.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn missing_distance_sorts_last_ascending() {
        let mut results = vec![
            result("far", 3.0, 5, Some(900.0)),
            result("unknown", 3.0, 5, None),
            result("near", 3.0, 5, Some(100.0)),
        ];
        sort_results(&mut results, SortBy::Distance, SortOrder::Asc);

        let names: Vec<&str> = results.iter().map(|r| r.business.name.as_str()).collect();
        assert_eq!(names, vec!["near", "far", "unknown"]);
    }
}
