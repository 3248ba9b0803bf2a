use serde::{Deserialize, Serialize};

/// Valid GPA range (inclusive)
pub const GPA_RANGE: std::ops::RangeInclusive<f64> = 0.0..=4.0;
/// Valid SAT range (inclusive)
pub const SAT_RANGE: std::ops::RangeInclusive<u32> = 400..=1600;
/// Valid ACT range (inclusive)
pub const ACT_RANGE: std::ops::RangeInclusive<u32> = 1..=36;

/// Values that stand in for a missing name or location
const PLACEHOLDERS: &[&str] = &[
    "unknown",
    "n/a",
    "na",
    "none",
    "null",
    "unknown university",
    "unknown college",
    "unknown location",
];

/// Student profile accumulated across the turns of one conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub gpa: Option<f64>,
    pub sat_score: Option<u32>,
    pub act_score: Option<u32>,
    #[serde(default)]
    pub major_preference: Vec<String>,
    #[serde(default)]
    pub location_preference: Vec<String>,
    pub budget: Option<Budget>,
}

impl UserProfile {
    pub fn is_empty(&self) -> bool {
        self.gpa.is_none()
            && self.sat_score.is_none()
            && self.act_score.is_none()
            && self.major_preference.is_empty()
            && self.location_preference.is_empty()
            && self.budget.is_none()
    }

    /// Maximum annual tuition, if the student gave a budget
    pub fn max_tuition(&self) -> Option<f64> {
        self.budget.as_ref().map(|b| b.max_annual_tuition)
    }
}

/// Annual tuition ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub max_annual_tuition: f64,
    #[serde(rename = "type", default)]
    pub kind: BudgetKind,
}

impl Budget {
    /// Build an "under" budget; non-positive or non-finite amounts are rejected
    pub fn under(max_annual_tuition: f64) -> Option<Self> {
        (max_annual_tuition.is_finite() && max_annual_tuition > 0.0).then_some(Self {
            max_annual_tuition,
            kind: BudgetKind::Under,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    #[default]
    Under,
}

/// One institution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct College {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub ranking: Option<u32>,
    #[serde(default)]
    pub tuition: Option<u64>,
    #[serde(default)]
    pub acceptance_rate: Option<f64>,
    #[serde(default)]
    pub avg_sat: Option<u32>,
    #[serde(default)]
    pub avg_gpa: Option<f64>,
    #[serde(default)]
    pub majors: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fit_score: f64,
}

impl College {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            ranking: None,
            tuition: None,
            acceptance_rate: None,
            avg_sat: None,
            avg_gpa: None,
            majors: Vec::new(),
            description: String::new(),
            fit_score: 0.0,
        }
    }

    /// A college is usable only with a real name and location
    pub fn is_valid(&self) -> bool {
        is_real_value(&self.name) && is_real_value(&self.location)
    }

    /// Text searched by the static dataset provider
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name,
            self.location,
            self.majors.join(" "),
            self.description
        )
        .to_lowercase()
    }
}

fn is_real_value(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && !PLACEHOLDERS
            .iter()
            .any(|p| trimmed.eq_ignore_ascii_case(p))
}

/// One hit returned by a search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college_data: Option<College>,
}

impl RawResult {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
            college_data: None,
        }
    }

    /// Wrap a structured record so it bypasses extraction
    pub fn from_college(college: College) -> Self {
        Self {
            title: college.name.clone(),
            snippet: college.description.clone(),
            url: String::new(),
            college_data: Some(college),
        }
    }
}

/// Search parameters derived from the profile for one recommendation cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQueryParams {
    pub majors: Option<Vec<String>>,
    pub location: Option<Vec<String>>,
    pub max_tuition: Option<f64>,
}

impl SearchQueryParams {
    pub fn from_profile(profile: &UserProfile) -> Self {
        let non_empty = |v: &Vec<String>| (!v.is_empty()).then(|| v.clone());

        Self {
            majors: non_empty(&profile.major_preference),
            location: non_empty(&profile.location_preference),
            max_tuition: profile.max_tuition(),
        }
    }

    /// Render the free-text query sent to the provider chain
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();

        if let Some(majors) = &self.majors {
            parts.push(format!("{} programs", majors.join(" ")));
        }
        if let Some(locations) = &self.location {
            parts.push(format!("in {}", locations.join(" ")));
        }

        if parts.is_empty() {
            "top universities".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// What the student is asking for in one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CollegeMatch,
    EssayRevise,
    SchedulePlan,
    GeneralQa,
}

/// Scoring weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub academic: f64,
    pub major: f64,
    pub location: f64,
    pub affordability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            academic: 0.4,
            major: 0.3,
            location: 0.2,
            affordability: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_college_validity() {
        assert!(College::new("MIT", "Cambridge, Massachusetts").is_valid());
        assert!(!College::new("", "Cambridge").is_valid());
        assert!(!College::new("MIT", "  ").is_valid());
        assert!(!College::new("Unknown", "Boston").is_valid());
        assert!(!College::new("MIT", "N/A").is_valid());
    }

    #[test]
    fn test_budget_rejects_non_positive() {
        assert!(Budget::under(0.0).is_none());
        assert!(Budget::under(-5.0).is_none());
        assert_eq!(Budget::under(50000.0).map(|b| b.max_annual_tuition), Some(50000.0));
    }

    #[test]
    fn test_query_params_render() {
        let profile = UserProfile {
            major_preference: vec!["Computer Science".to_string()],
            location_preference: vec!["California".to_string()],
            budget: Budget::under(30000.0),
            ..Default::default()
        };

        let params = SearchQueryParams::from_profile(&profile);
        assert_eq!(params.max_tuition, Some(30000.0));
        assert_eq!(params.to_query(), "Computer Science programs in California");
        assert_eq!(SearchQueryParams::default().to_query(), "top universities");
    }

    #[test]
    fn test_budget_serializes_type_tag() {
        let budget = Budget::under(20000.0).unwrap();
        let json = serde_json::to_value(&budget).unwrap();
        assert_eq!(json["type"], "under");
        assert_eq!(json["max_annual_tuition"], 20000.0);
    }
}
