use crate::models::{College, SearchQueryParams};
use crate::core::normalize::{contains_ci, overlaps_ci};

/// Outcome of applying the budget ceiling to a candidate list
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetFiltered {
    pub colleges: Vec<College>,
    /// True when nothing fit the budget and the unfiltered list was kept
    pub relaxed: bool,
}

/// Keep colleges whose tuition is within `max_tuition`
///
/// Colleges with unknown tuition stay in. If the ceiling would remove every
/// college, the input is returned unchanged and `relaxed` is set, so a
/// non-empty candidate list never turns into an empty one.
pub fn apply_budget_filter(colleges: Vec<College>, max_tuition: Option<f64>) -> BudgetFiltered {
    let Some(max_tuition) = max_tuition else {
        return BudgetFiltered { colleges, relaxed: false };
    };

    let within: Vec<College> = colleges
        .iter()
        .filter(|c| within_budget(c, max_tuition))
        .cloned()
        .collect();

    if within.is_empty() && !colleges.is_empty() {
        tracing::debug!(
            "No college within budget {} out of {}, keeping unfiltered list",
            max_tuition,
            colleges.len()
        );
        return BudgetFiltered { colleges, relaxed: true };
    }

    BudgetFiltered { colleges: within, relaxed: false }
}

#[inline]
fn within_budget(college: &College, max_tuition: f64) -> bool {
    college.tuition.map_or(true, |t| t as f64 <= max_tuition)
}

/// Check if a college offers any of the requested majors
#[inline]
pub fn matches_majors(college: &College, majors: &[String]) -> bool {
    majors.is_empty()
        || majors
            .iter()
            .any(|wanted| college.majors.iter().any(|offered| overlaps_ci(wanted, offered)))
}

/// Check if a college sits in any of the requested locations
#[inline]
pub fn matches_locations(college: &College, locations: &[String]) -> bool {
    locations.is_empty() || locations.iter().any(|loc| contains_ci(&college.location, loc))
}

/// Filter a structured dataset by the query parameters
///
/// Used when web results could not be turned into college records. Tuition
/// is not filtered here; the budget ceiling is applied after scoring.
pub fn filter_by_params(colleges: &[College], params: &SearchQueryParams) -> Vec<College> {
    let majors = params.majors.as_deref().unwrap_or_default();
    let locations = params.location.as_deref().unwrap_or_default();

    colleges
        .iter()
        .filter(|c| matches_majors(c, majors))
        .filter(|c| matches_locations(c, locations))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_college(name: &str, location: &str, tuition: Option<u64>, majors: &[&str]) -> College {
        College {
            tuition,
            majors: majors.iter().map(|m| m.to_string()).collect(),
            ..College::new(name, location)
        }
    }

    fn create_test_colleges() -> Vec<College> {
        vec![
            create_test_college("Expensive", "Boston, Massachusetts", Some(60000), &["Computer Science"]),
            create_test_college("Cheap", "Austin, Texas", Some(11000), &["Business"]),
            create_test_college("Unknown Cost", "Denver, Colorado", None, &["Physics"]),
        ]
    }

    #[test]
    fn test_budget_filter_keeps_affordable_and_unknown() {
        let result = apply_budget_filter(create_test_colleges(), Some(20000.0));
        assert!(!result.relaxed);
        let names: Vec<_> = result.colleges.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Cheap", "Unknown Cost"]);
    }

    #[test]
    fn test_budget_filter_never_empties() {
        let colleges = vec![create_test_college("Expensive", "Boston", Some(60000), &[])];
        let result = apply_budget_filter(colleges.clone(), Some(10000.0));
        assert!(result.relaxed);
        assert_eq!(result.colleges, colleges);
    }

    #[test]
    fn test_no_budget_is_passthrough() {
        let result = apply_budget_filter(create_test_colleges(), None);
        assert_eq!(result.colleges.len(), 3);
        assert!(!result.relaxed);
    }

    #[test]
    fn test_filter_by_params() {
        let params = SearchQueryParams {
            majors: Some(vec!["computer science".to_string()]),
            location: Some(vec!["massachusetts".to_string()]),
            max_tuition: None,
        };
        let result = filter_by_params(&create_test_colleges(), &params);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Expensive");

        let all = filter_by_params(&create_test_colleges(), &SearchQueryParams::default());
        assert_eq!(all.len(), 3);
    }
}
