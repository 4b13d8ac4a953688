use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    #[serde(default)]
    pub consultant_id: Option<Uuid>,
    pub consultant_name: String,
    pub client_name: String,
    pub rating: u8,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub review_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub consultant_id: Option<Uuid>,
    pub consultant_name: String,
    pub client_name: String,
    pub rating: u8,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub review_date: NaiveDate,
}

impl ReviewInput {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.consultant_name.trim().is_empty() {
            return Err("consultant_name is required");
        }
        if self.client_name.trim().is_empty() {
            return Err("client_name is required");
        }
        if !(1..=5).contains(&self.rating) {
            return Err("rating must be between 1 and 5");
        }
        Ok(())
    }
}

pub fn search<'a>(reviews: &'a [Review], text: &str) -> Vec<&'a Review> {
    let needle = text.trim().to_lowercase();
    reviews
        .iter()
        .filter(|r| {
            needle.is_empty()
                || r.client_name.to_lowercase().contains(&needle)
                || r.consultant_name.to_lowercase().contains(&needle)
                || r.text.as_deref().is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect()
}

fn average(sum: u32, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sum as f64 / count as f64 * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReviewLeader {
    pub rank: usize,
    pub consultant_name: String,
    pub count: usize,
    pub average_rating: f64,
}

/// Ranked by review count, then average rating, then name.
pub fn leaderboard(reviews: &[&Review]) -> Vec<ReviewLeader> {
    let mut per_consultant: HashMap<String, (String, usize, u32)> = HashMap::new();
    for review in reviews {
        let key = review
            .consultant_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| review.consultant_name.to_lowercase());
        let entry = per_consultant
            .entry(key)
            .or_insert_with(|| (review.consultant_name.clone(), 0, 0));
        entry.1 += 1;
        entry.2 += review.rating as u32;
    }

    let mut leaders: Vec<ReviewLeader> = per_consultant
        .into_values()
        .map(|(name, count, sum)| ReviewLeader {
            rank: 0,
            consultant_name: name,
            count,
            average_rating: average(sum, count),
        })
        .collect();
    leaders.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| {
                b.average_rating
                    .partial_cmp(&a.average_rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.consultant_name.cmp(&b.consultant_name))
    });
    for (idx, leader) in leaders.iter_mut().enumerate() {
        leader.rank = idx + 1;
    }
    leaders
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReviewSummary {
    pub total: usize,
    pub average_rating: f64,
    pub by_rating: BTreeMap<u8, usize>,
}

pub fn summary(reviews: &[&Review]) -> ReviewSummary {
    let mut by_rating: BTreeMap<u8, usize> = (1..=5).map(|r| (r, 0)).collect();
    let mut sum = 0u32;
    for review in reviews {
        *by_rating.entry(review.rating).or_insert(0) += 1;
        sum += review.rating as u32;
    }
    ReviewSummary {
        total: reviews.len(),
        average_rating: average(sum, reviews.len()),
        by_rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(consultant: &str, client: &str, rating: u8) -> Review {
        Review {
            id: Uuid::new_v4(),
            consultant_id: None,
            consultant_name: consultant.into(),
            client_name: client.into(),
            rating,
            platform: Some("google".into()),
            text: Some(format!("{consultant} fixed my report")),
            review_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[test]
    fn leaderboard_and_summary() {
        let reviews = vec![
            review("Ana", "J. Smith", 5),
            review("Ana", "K. Lee", 4),
            review("Ben", "M. Ruiz", 5),
        ];
        let all: Vec<&Review> = reviews.iter().collect();
        let leaders = leaderboard(&all);
        assert_eq!(leaders[0].consultant_name, "Ana");
        assert_eq!(leaders[0].average_rating, 4.5);
        assert_eq!(leaders[1].rank, 2);

        let s = summary(&all);
        assert_eq!(s.total, 3);
        assert_eq!(s.average_rating, 4.67);
        assert_eq!(s.by_rating[&5], 2);
        assert_eq!(s.by_rating[&1], 0);
    }

    #[test]
    fn search_and_validation() {
        let reviews = vec![review("Ana", "J. Smith", 5), review("Ben", "K. Lee", 3)];
        assert_eq!(search(&reviews, "smith").len(), 1);
        assert_eq!(search(&reviews, "BEN fixed").len(), 1);

        let input = ReviewInput {
            consultant_id: None,
            consultant_name: "Ana".into(),
            client_name: "J. Smith".into(),
            rating: 6,
            platform: None,
            text: None,
            review_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let s = summary(&[]);
        assert_eq!(s.total, 0);
        assert_eq!(s.average_rating, 0.0);
    }
}
