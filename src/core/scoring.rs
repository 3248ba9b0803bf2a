use crate::models::{College, UserProfile, ScoringWeights};
use crate::core::normalize::{contains_ci, overlaps_ci};

/// Score used when no dimension applies to a (college, profile) pair
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Calculate a fit score (0-1) for a college based on the student's profile
///
/// Scoring formula:
/// score = (
///     academic_score * 0.4 +       # GPA / SAT closeness
///     major_score * 0.3 +          # Share of wanted majors offered
///     location_score * 0.2 +       # Preferred location hit
///     affordability_score * 0.1    # Tuition against budget
/// ) / sum of the weights that applied
///
/// A dimension without the inputs it needs is left out of both the sum and
/// the denominator, so missing data never drags a college down.
pub fn calculate_fit_score(
    college: &College,
    profile: &UserProfile,
    weights: &ScoringWeights,
) -> f64 {
    let dimensions = [
        (academic_score(college, profile), weights.academic),
        (major_score(college, profile), weights.major),
        (location_score(college, profile), weights.location),
        (affordability_score(college, profile), weights.affordability),
    ];

    let (weighted_sum, applied_weight) = dimensions
        .iter()
        .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
        .fold((0.0, 0.0), |(sum, total), (s, w)| (sum + s, total + w));

    if applied_weight <= 0.0 {
        return NEUTRAL_SCORE;
    }

    (weighted_sum / applied_weight).clamp(0.0, 1.0)
}

/// Academic closeness (0-1)
///
/// Averages GPA and SAT closeness over the components both sides report.
pub fn academic_score(college: &College, profile: &UserProfile) -> Option<f64> {
    if profile.gpa.is_none() && profile.sat_score.is_none() {
        return None;
    }

    let gpa = profile
        .gpa
        .zip(college.avg_gpa)
        .map(|(mine, theirs)| (1.0 - (theirs - mine).abs() / 2.0).max(0.0));

    let sat = profile
        .sat_score
        .zip(college.avg_sat)
        .map(|(mine, theirs)| (1.0 - (theirs as f64 - mine as f64).abs() / 400.0).max(0.0));

    let components: Vec<f64> = [gpa, sat].into_iter().flatten().collect();
    if components.is_empty() {
        return None;
    }

    Some(components.iter().sum::<f64>() / components.len() as f64)
}

/// Major overlap (0-1)
///
/// Share of the student's majors that match at least one college major.
pub fn major_score(college: &College, profile: &UserProfile) -> Option<f64> {
    if profile.major_preference.is_empty() || college.majors.is_empty() {
        return None;
    }

    let matched = profile
        .major_preference
        .iter()
        .filter(|wanted| college.majors.iter().any(|offered| overlaps_ci(wanted, offered)))
        .count();

    Some(matched as f64 / profile.major_preference.len() as f64)
}

/// Location hit (0 or 1)
pub fn location_score(college: &College, profile: &UserProfile) -> Option<f64> {
    if profile.location_preference.is_empty() {
        return None;
    }

    let hit = profile
        .location_preference
        .iter()
        .any(|loc| contains_ci(&college.location, loc));

    Some(if hit { 1.0 } else { 0.0 })
}

/// Affordability against the annual budget (0-1)
pub fn affordability_score(college: &College, profile: &UserProfile) -> Option<f64> {
    let budget = profile.max_tuition()?;
    let tuition = college.tuition? as f64;

    if tuition <= budget {
        if tuition <= 0.0 {
            return Some(1.0);
        }
        Some((budget / tuition - 0.5).min(1.0))
    } else {
        Some((1.0 - (tuition - budget) / budget).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Budget;

    fn create_test_college() -> College {
        College {
            avg_gpa: Some(3.8),
            avg_sat: Some(1450),
            tuition: Some(30000),
            majors: vec!["Computer Science".to_string(), "Engineering".to_string()],
            ..College::new("Test University", "Seattle, Washington")
        }
    }

    fn create_test_profile() -> UserProfile {
        UserProfile {
            gpa: Some(3.8),
            sat_score: Some(1450),
            major_preference: vec!["computer science".to_string()],
            location_preference: vec!["Washington".to_string()],
            budget: Budget::under(50000.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_perfect_fit() {
        let weights = ScoringWeights::default();
        let score = calculate_fit_score(&create_test_college(), &create_test_profile(), &weights);
        assert!((score - 1.0).abs() < 1e-9, "expected 1.0, got {}", score);
    }

    #[test]
    fn test_empty_profile_is_neutral() {
        let weights = ScoringWeights::default();
        let score = calculate_fit_score(&create_test_college(), &UserProfile::default(), &weights);
        assert_eq!(score, NEUTRAL_SCORE);
    }

    #[test]
    fn test_academic_score() {
        let college = create_test_college();
        let mut profile = create_test_profile();
        assert_eq!(academic_score(&college, &profile), Some(1.0));

        // GPA off by 1.0 → 0.5, SAT off by 200 → 0.5
        profile.gpa = Some(2.8);
        profile.sat_score = Some(1250);
        let score = academic_score(&college, &profile).unwrap();
        assert!((score - 0.5).abs() < 1e-9);

        // College without academic data cannot be compared
        let bare = College::new("Bare", "Nowhere");
        assert_eq!(academic_score(&bare, &profile), None);
    }

    #[test]
    fn test_major_score() {
        let college = create_test_college();
        let mut profile = create_test_profile();
        profile.major_preference = vec!["computer".to_string(), "Medicine".to_string()];
        assert_eq!(major_score(&college, &profile), Some(0.5));
    }

    #[test]
    fn test_location_score() {
        let college = create_test_college();
        let mut profile = create_test_profile();
        assert_eq!(location_score(&college, &profile), Some(1.0));

        profile.location_preference = vec!["Texas".to_string()];
        assert_eq!(location_score(&college, &profile), Some(0.0));
    }

    #[test]
    fn test_affordability_score() {
        let mut college = create_test_college();
        let profile = create_test_profile();

        // Well under budget saturates at 1.0
        assert_eq!(affordability_score(&college, &profile), Some(1.0));

        college.tuition = Some(40000);
        // 50000 / 40000 - 0.5 = 0.75
        assert_eq!(affordability_score(&college, &profile), Some(0.75));

        // 25% over budget → 0.75
        college.tuition = Some(62500);
        assert_eq!(affordability_score(&college, &profile), Some(0.75));

        // Twice the budget → 0
        college.tuition = Some(100000);
        assert_eq!(affordability_score(&college, &profile), Some(0.0));

        college.tuition = Some(0);
        assert_eq!(affordability_score(&college, &profile), Some(1.0));
    }
}
