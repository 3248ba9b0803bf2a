//! Markdown rendering of a recommendation cycle.

use std::fmt::Write;

use crate::core::matcher::Recommendation;
use crate::models::{College, UserProfile};

/// Fit score at or above which a college is an excellent match
pub const EXCELLENT_THRESHOLD: f64 = 0.8;
/// Fit score at or above which a college is a good match
pub const GOOD_THRESHOLD: f64 = 0.6;
/// Annual tuition above which a scholarship tip is added
pub const SCHOLARSHIP_TUITION_THRESHOLD: u64 = 50_000;

/// Progress narration sent while a recommendation cycle runs
pub const PROGRESS_STEPS: [&str; 4] = [
    "🔍 **Step 1**: Analyzing your academic profile and preferences...",
    "🌐 **Step 2**: Searching university data sources...",
    "🎯 **Step 3**: Calculating fit scores...",
    "✅ **Step 4**: Generating personalized recommendations...",
];

/// Shown when no college could be found at all
pub const NO_RESULTS_ADVICE: &str = "## 🎓 College Recommendations\n\n\
I couldn't find college data for your profile right now. Some general guidance while you refine your search:\n\n\
- Build a balanced list with reach, match and safety schools.\n\
- Compare your GPA and test scores with each school's published averages.\n\
- Check each school's net price calculator, not just the sticker tuition.\n\
- Tell me more about your intended major, preferred locations and budget so I can narrow things down.";

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Excellent,
    Good,
    Other,
}

impl Tier {
    fn of(fit_score: f64) -> Self {
        if fit_score >= EXCELLENT_THRESHOLD {
            Tier::Excellent
        } else if fit_score >= GOOD_THRESHOLD {
            Tier::Good
        } else {
            Tier::Other
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Tier::Excellent => "### 🌟 Excellent Matches",
            Tier::Good => "### 👍 Good Matches",
            Tier::Other => "### 📋 Other Options",
        }
    }
}

/// Format a dollar amount with thousands separators
pub fn format_usd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Percentage label for a fit score, e.g. `"87% match"`
pub fn match_label(fit_score: f64) -> String {
    format!("{}% match", (fit_score.clamp(0.0, 1.0) * 100.0).round() as u32)
}

/// One-line summary of what is known about the student
pub fn profile_summary(profile: &UserProfile) -> String {
    let mut parts = Vec::new();

    if let Some(gpa) = profile.gpa {
        parts.push(format!("GPA {}", gpa));
    }
    if let Some(sat) = profile.sat_score {
        parts.push(format!("SAT {}", sat));
    }
    if let Some(act) = profile.act_score {
        parts.push(format!("ACT {}", act));
    }
    if !profile.major_preference.is_empty() {
        parts.push(format!("Interests: {}", profile.major_preference.join(", ")));
    }
    if !profile.location_preference.is_empty() {
        parts.push(format!("Locations: {}", profile.location_preference.join(", ")));
    }
    if let Some(max) = profile.max_tuition() {
        parts.push(format!("Budget: under {}/year", format_usd(max.round() as u64)));
    }

    if parts.is_empty() {
        "**Your Profile**: not much yet, tell me your GPA, test scores and interests".to_string()
    } else {
        format!("**Your Profile**: {}", parts.join(", "))
    }
}

fn render_college(out: &mut String, number: usize, college: &College) {
    let tuition = college
        .tuition
        .map(|t| format!("{}/year", format_usd(t)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let acceptance = college
        .acceptance_rate
        .map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let ranking = college
        .ranking
        .map(|r| format!("#{}", r))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let avg_sat = college
        .avg_sat
        .map(|s| s.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let avg_gpa = college
        .avg_gpa
        .map(|g| format!("{:.2}", g))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let _ = writeln!(out, "**{}. {}** ({})", number, college.name, match_label(college.fit_score));
    let _ = writeln!(
        out,
        "📍 {} | 💰 {} | 📈 {} acceptance | 🏆 Rank {}",
        college.location, tuition, acceptance, ranking
    );
    let _ = writeln!(out, "📊 Avg SAT: {} | Avg GPA: {}", avg_sat, avg_gpa);

    if !college.majors.is_empty() {
        let top: Vec<&str> = college.majors.iter().take(3).map(String::as_str).collect();
        let _ = writeln!(out, "🎯 Strong in: {}", top.join(", "));
    }
    if !college.description.is_empty() {
        let _ = writeln!(out, "💡 {}", college.description);
    }
    out.push('\n');
}

/// Closing advice keyed on the mean fit of the shown colleges
pub fn advice(colleges: &[College]) -> String {
    if colleges.is_empty() {
        return String::new();
    }

    let mean = colleges.iter().map(|c| c.fit_score).sum::<f64>() / colleges.len() as f64;

    let mut text = String::from("### 💭 Advice\n");
    text.push_str(if mean >= 0.75 {
        "Your profile lines up well with these schools. Consider early action or early decision at your top choice and keep a couple of safer options on your list."
    } else if mean >= 0.5 {
        "These schools are a reasonable fit. Mix in some reach and safety schools, and use your essays to show what sets you apart."
    } else {
        "Fit scores are modest for this set. Try widening your majors or locations, or look at schools where your scores sit above the average."
    });

    let expensive = colleges
        .iter()
        .any(|c| c.tuition.is_some_and(|t| t > SCHOLARSHIP_TUITION_THRESHOLD));
    if expensive {
        text.push_str(
            "\n\n💵 Some of these schools cost more than $50,000 a year. Look into merit scholarships and need-based aid early.",
        );
    }

    text
}

/// Render the tiered recommendation report
pub fn render_report(profile: &UserProfile, recommendation: &Recommendation) -> String {
    if recommendation.colleges.is_empty() {
        return NO_RESULTS_ADVICE.to_string();
    }

    let mut out = String::from("## 🎓 College Recommendations\n\n");
    out.push_str(&profile_summary(profile));
    out.push_str("\n\n");

    if recommendation.budget_relaxed {
        if let Some(max) = profile.max_tuition() {
            let _ = writeln!(
                out,
                "⚠️ None of the schools found are within your budget of {}/year, so all results are shown.\n",
                format_usd(max.round() as u64)
            );
        }
    }

    let mut current_tier = None;
    for (index, college) in recommendation.colleges.iter().enumerate() {
        let tier = Tier::of(college.fit_score);
        if current_tier != Some(tier) {
            out.push_str(tier.heading());
            out.push_str("\n\n");
            current_tier = Some(tier);
        }
        render_college(&mut out, index + 1, college);
    }

    out.push_str(&advice(&recommendation.colleges));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Budget;

    fn scored(name: &str, fit_score: f64, tuition: Option<u64>) -> College {
        College {
            fit_score,
            tuition,
            majors: vec!["Computer Science".into(), "Mathematics".into(), "Physics".into(), "Biology".into()],
            ..College::new(name, "Somewhere, USA")
        }
    }

    fn recommendation(colleges: Vec<College>) -> Recommendation {
        Recommendation {
            total_candidates: colleges.len(),
            colleges,
            budget_relaxed: false,
        }
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0), "$0");
        assert_eq!(format_usd(999), "$999");
        assert_eq!(format_usd(57986), "$57,986");
        assert_eq!(format_usd(1234567), "$1,234,567");
    }

    #[test]
    fn test_match_label() {
        assert_eq!(match_label(0.873), "87% match");
        assert_eq!(match_label(1.0), "100% match");
    }

    #[test]
    fn test_tiers_with_continuous_numbering() {
        let report = render_report(
            &UserProfile::default(),
            &recommendation(vec![
                scored("Alpha", 0.9, Some(20000)),
                scored("Beta", 0.7, Some(20000)),
                scored("Gamma", 0.3, None),
            ]),
        );

        let excellent = report.find("Excellent Matches").unwrap();
        let good = report.find("Good Matches").unwrap();
        let other = report.find("Other Options").unwrap();
        assert!(excellent < good && good < other);

        assert!(report.contains("**1. Alpha** (90% match)"));
        assert!(report.contains("**2. Beta** (70% match)"));
        assert!(report.contains("**3. Gamma** (30% match)"));
        assert!(report.contains("💰 N/A"));
        assert!(report.contains("🎯 Strong in: Computer Science, Mathematics, Physics\n"));
    }

    #[test]
    fn test_scholarship_tip() {
        let cheap = advice(&[scored("A", 0.8, Some(30000))]);
        assert!(!cheap.contains("scholarships"));

        let expensive = advice(&[scored("A", 0.8, Some(58000))]);
        assert!(expensive.contains("scholarships"));
    }

    #[test]
    fn test_advice_tiers() {
        assert!(advice(&[scored("A", 0.9, None)]).contains("lines up well"));
        assert!(advice(&[scored("A", 0.6, None)]).contains("reasonable fit"));
        assert!(advice(&[scored("A", 0.2, None)]).contains("modest"));
    }

    #[test]
    fn test_budget_relaxed_note() {
        let profile = UserProfile {
            budget: Budget::under(10000.0),
            ..Default::default()
        };
        let mut rec = recommendation(vec![scored("A", 0.5, Some(40000))]);
        rec.budget_relaxed = true;

        let report = render_report(&profile, &rec);
        assert!(report.contains("within your budget of $10,000/year"));
    }

    #[test]
    fn test_profile_summary() {
        let profile = UserProfile {
            gpa: Some(3.8),
            sat_score: Some(1450),
            major_preference: vec!["Computer Science".into()],
            ..Default::default()
        };
        assert_eq!(
            profile_summary(&profile),
            "**Your Profile**: GPA 3.8, SAT 1450, Interests: Computer Science"
        );
    }

    #[test]
    fn test_empty_recommendation_gives_advice() {
        let report = render_report(&UserProfile::default(), &recommendation(Vec::new()));
        assert_eq!(report, NO_RESULTS_ADVICE);
    }
}
