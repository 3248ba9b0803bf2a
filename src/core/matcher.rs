use std::cmp::Ordering;

use crate::models::{College, UserProfile, ScoringWeights};
use crate::core::{
    filters::apply_budget_filter,
    scoring::calculate_fit_score,
};

/// Number of colleges shown in one report
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 8;

/// Result of one recommendation cycle
#[derive(Debug, Clone)]
pub struct Recommendation {
    /// Ranked colleges, best first, at most `limit` long
    pub colleges: Vec<College>,
    pub total_candidates: usize,
    /// Nothing fit the budget, so the budget was ignored
    pub budget_relaxed: bool,
}

/// Ranking orchestrator - implements the scoring pipeline
///
/// # Pipeline Stages
/// 1. Fit scoring of every candidate
/// 2. Budget filtering (never empties a non-empty list)
/// 3. Sorting by fit score
/// 4. Truncation to the report size
#[derive(Debug, Clone)]
pub struct Recommender {
    weights: ScoringWeights,
    limit: usize,
}

impl Recommender {
    pub fn new(weights: ScoringWeights, limit: usize) -> Self {
        Self { weights, limit }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), DEFAULT_RECOMMENDATION_LIMIT)
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rank candidate colleges for a student
    ///
    /// # Arguments
    /// * `profile` - The student's accumulated profile
    /// * `candidates` - Colleges found for this cycle
    ///
    /// # Returns
    /// Recommendation containing scored and ranked colleges
    pub fn recommend(&self, profile: &UserProfile, candidates: Vec<College>) -> Recommendation {
        let total_candidates = candidates.len();

        let scored: Vec<College> = candidates
            .into_iter()
            .map(|mut college| {
                college.fit_score = calculate_fit_score(&college, profile, &self.weights);
                college
            })
            .collect();

        let filtered = apply_budget_filter(scored, profile.max_tuition());
        let mut colleges = filtered.colleges;

        // Sort by score (descending), then ranking (ascending, unranked last), then name
        colleges.sort_by(|a, b| {
            b.fit_score
                .partial_cmp(&a.fit_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| compare_rankings(a.ranking, b.ranking))
                .then_with(|| a.name.cmp(&b.name))
        });

        colleges.truncate(self.limit);

        Recommendation {
            colleges,
            total_candidates,
            budget_relaxed: filtered.relaxed,
        }
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

fn compare_rankings(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
