// Unit tests for UniGuide

use uniguide::core::{
    detect_intent,
    extraction::{coerce_college, parse_colleges},
    filters::apply_budget_filter,
    profile::{merge_profile, ProfileDelta},
    scoring::{academic_score, calculate_fit_score, NEUTRAL_SCORE},
};
use uniguide::models::{Budget, College, Intent, ScoringWeights, UserProfile};
use uniguide::services::{seed_colleges, StaticDatasetSearch};

fn create_test_college() -> College {
    College {
        ranking: Some(10),
        tuition: Some(45000),
        acceptance_rate: Some(0.2),
        avg_sat: Some(1400),
        avg_gpa: Some(3.7),
        majors: vec!["Computer Science".to_string(), "Physics".to_string()],
        description: "Research university".to_string(),
        ..College::new("Test University", "Austin, Texas")
    }
}

fn create_test_profile() -> UserProfile {
    UserProfile {
        gpa: Some(3.5),
        sat_score: Some(1300),
        act_score: None,
        major_preference: vec!["computer science".to_string(), "art history".to_string()],
        location_preference: vec!["California".to_string()],
        budget: Budget::under(30000.0),
    }
}

#[test]
fn test_score_always_in_unit_interval() {
    let weights = ScoringWeights::default();
    let profiles = vec![
        UserProfile::default(),
        create_test_profile(),
        UserProfile {
            gpa: Some(0.0),
            sat_score: Some(400),
            budget: Budget::under(1.0),
            ..Default::default()
        },
    ];
    let colleges = vec![
        create_test_college(),
        College::new("Bare", "Nowhere, USA"),
        College {
            tuition: Some(0),
            avg_sat: Some(1600),
            avg_gpa: Some(4.0),
            ..College::new("Free", "Somewhere")
        },
    ];

    for profile in &profiles {
        for college in &colleges {
            let score = calculate_fit_score(college, profile, &weights);
            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }
}

#[test]
fn test_neutral_score_when_nothing_applies() {
    let score = calculate_fit_score(
        &create_test_college(),
        &UserProfile::default(),
        &ScoringWeights::default(),
    );
    assert_eq!(score, NEUTRAL_SCORE);
}

#[test]
fn test_academic_identical_inputs() {
    let college = create_test_college();
    let profile = UserProfile {
        gpa: college.avg_gpa,
        sat_score: college.avg_sat,
        ..Default::default()
    };
    assert_eq!(academic_score(&college, &profile), Some(1.0));
}

#[test]
fn test_scoring_is_idempotent() {
    let college = create_test_college();
    let profile = create_test_profile();
    let weights = ScoringWeights::default();

    let first = calculate_fit_score(&college, &profile, &weights);
    let second = calculate_fit_score(&college, &profile, &weights);
    assert_eq!(first, second);
}

#[test]
fn test_partial_profile_scores() {
    // Only location applies and it misses
    let profile = UserProfile {
        location_preference: vec!["Oregon".to_string()],
        ..Default::default()
    };
    let score = calculate_fit_score(&create_test_college(), &profile, &ScoringWeights::default());
    assert_eq!(score, 0.0);
}

#[test]
fn test_budget_filter_never_empties_nonempty_input() {
    for budget in [1.0, 100.0, 10_000.0, 1_000_000.0] {
        let result = apply_budget_filter(seed_colleges(), Some(budget));
        assert!(!result.colleges.is_empty(), "budget {} emptied the list", budget);
    }
}

#[test]
fn test_intent_routing() {
    assert_eq!(detect_intent("asdf1234"), Intent::CollegeMatch);
    assert_eq!(detect_intent("我的GPA是3.8，SAT 1450，想学计算机科学"), Intent::CollegeMatch);
    assert_eq!(detect_intent("Can you revise my essay draft?"), Intent::EssayRevise);
    assert_eq!(detect_intent("帮我做一个时间表"), Intent::SchedulePlan);
    assert_eq!(detect_intent("How does early decision work?"), Intent::GeneralQa);
}

#[test]
fn test_validity_filter_on_extraction() {
    let text = r#"[
        {"name": "Rice University", "location": "Houston, TX"},
        {"name": "Unknown University", "location": "Houston, TX"},
        {"name": "Tulane University", "location": "unknown location"},
        {"name": "", "location": "New Orleans, LA"},
        {"location": "Dallas, TX"}
    ]"#;

    let colleges = parse_colleges(text).unwrap();
    assert_eq!(colleges.len(), 1);
    assert_eq!(colleges[0].name, "Rice University");
}

#[test]
fn test_coerce_college_percent_and_money() {
    let college = coerce_college(&serde_json::json!({
        "name": "Boston University",
        "location": "Boston, MA",
        "tuition": "$65,168",
        "acceptance_rate": 11,
    }))
    .unwrap();

    assert_eq!(college.tuition, Some(65168));
    assert_eq!(college.acceptance_rate, Some(0.11));
}

#[test]
fn test_profile_merge_keeps_existing_values() {
    let mut profile = create_test_profile();
    merge_profile(&mut profile, ProfileDelta::default());
    assert_eq!(profile, create_test_profile());

    merge_profile(
        &mut profile,
        ProfileDelta {
            gpa: Some(-1.0),
            act_score: Some(40),
            locations: vec!["california".to_string(), "Texas".to_string()],
            ..Default::default()
        },
    );
    assert_eq!(profile.gpa, Some(3.5));
    assert_eq!(profile.act_score, None);
    assert_eq!(profile.location_preference, vec!["California", "Texas"]);
}

#[test]
fn test_static_provider_computer_science() {
    let provider = StaticDatasetSearch::new(seed_colleges().into());
    let mut names: Vec<String> = provider
        .lookup("computer science")
        .into_iter()
        .map(|c| c.name)
        .collect();
    names.sort();

    assert_eq!(
        names,
        vec![
            "Carnegie Mellon University",
            "Georgia Institute of Technology",
            "Massachusetts Institute of Technology",
            "Stanford University",
            "University of California, Berkeley",
            "University of Washington",
        ]
    );
}
