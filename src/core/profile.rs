//! Profile deltas: what one message says about the student, and how it is
//! folded into the running profile.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::core::extraction::{coerce_f64, coerce_string_list, coerce_u64};
use crate::core::normalize::merge_unique;
use crate::models::{Budget, UserProfile};
use crate::models::domain::{ACT_RANGE, GPA_RANGE, SAT_RANGE};

// Score keywords may be followed by a short non-numeric phrase ("is just under")
static GPA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)gpa(?:[^a-z\d][^\d]{0,20}?)?(\d(?:\.\d{1,2})?)").expect("gpa regex is valid")
});

static SAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsat(?:[^a-z\d][^\d]{0,20}?)?(\d{3,4})\b").expect("sat regex is valid")
});

static ACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bact(?:[^a-z\d][^\d]{0,20}?)?(\d{1,2})\b").expect("act regex is valid")
});

static BUDGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<keyword>budget|afford|tuition|under|below|within|预算|学费|以内|不超过)\D{0,12}?(?P<dollar>\$)?\s*(?P<amount>\d[\d,]*(?:\.\d+)?)\s*(?P<unit>k|万)?",
    )
    .expect("budget regex is valid")
});

static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<amount>\d[\d,]*(?:\.\d+)?)\s*(?P<unit>k|万)?").expect("money regex is valid")
});

/// Keywords that make the following number a money amount on their own
const MONEY_KEYWORDS: &[&str] = &["budget", "afford", "tuition", "预算", "学费"];

/// Amounts this large read as money even after a bare "under" or "below"
const MIN_UNCUED_BUDGET: f64 = 1_000.0;

/// Phrases recognised as majors, with the canonical name stored in the profile
const MAJOR_ALIASES: &[(&[&str], &str)] = &[
    (&["computer science", "计算机", "cs专业"], "Computer Science"),
    (&["data science", "数据科学"], "Data Science"),
    (&["artificial intelligence", "人工智能"], "Artificial Intelligence"),
    (&["electrical engineering", "电子工程", "电气工程"], "Electrical Engineering"),
    (&["engineering", "工程"], "Engineering"),
    (&["business", "商科", "商业", "管理"], "Business"),
    (&["economics", "经济"], "Economics"),
    (&["finance", "金融"], "Finance"),
    (&["mathematics", "math", "数学"], "Mathematics"),
    (&["physics", "物理"], "Physics"),
    (&["biology", "生物"], "Biology"),
    (&["medicine", "pre-med", "医学"], "Medicine"),
    (&["pre-law", "law school", "法律"], "Law"),
    (&["psychology", "心理"], "Psychology"),
    (&["fine arts", "studio art", "艺术"], "Arts"),
];

/// Phrases recognised as locations, with the canonical name stored in the profile
const LOCATION_ALIASES: &[(&[&str], &str)] = &[
    (&["california", "加州", "加利福尼亚"], "California"),
    (&["massachusetts", "麻省", "马萨诸塞"], "Massachusetts"),
    (&["new york", "纽约"], "New York"),
    (&["texas", "德州", "得克萨斯"], "Texas"),
    (&["washington", "华盛顿", "西雅图", "seattle"], "Washington"),
    (&["pennsylvania", "宾州", "匹兹堡", "pittsburgh"], "Pennsylvania"),
    (&["georgia", "佐治亚", "亚特兰大", "atlanta"], "Georgia"),
    (&["michigan", "密歇根"], "Michigan"),
    (&["illinois", "伊利诺伊", "芝加哥", "chicago"], "Illinois"),
    (&["boston", "波士顿"], "Boston"),
];

/// Structured facts extracted from one chat message
///
/// Values are kept as extracted; range checks happen at merge time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDelta {
    pub gpa: Option<f64>,
    pub sat_score: Option<u32>,
    pub act_score: Option<u32>,
    pub majors: Vec<String>,
    pub locations: Vec<String>,
    pub budget: Option<Budget>,
}

impl ProfileDelta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Read a delta from the JSON object a model returned
    pub fn from_json(map: &Map<String, Value>) -> Self {
        let field = |key: &str| map.get(key).filter(|v| !v.is_null());
        let score = |key: &str| {
            field(key)
                .and_then(coerce_u64)
                .and_then(|s| u32::try_from(s).ok())
        };

        let mut majors = Vec::new();
        for key in ["major_preference", "majors", "interests"] {
            if let Some(value) = field(key) {
                merge_unique(&mut majors, coerce_string_list(value));
            }
        }

        let mut locations = Vec::new();
        for key in ["location_preference", "locations", "location"] {
            if let Some(value) = field(key) {
                merge_unique(&mut locations, coerce_string_list(value));
            }
        }

        Self {
            gpa: field("gpa").and_then(coerce_f64),
            sat_score: score("sat_score").or_else(|| score("sat")),
            act_score: score("act_score").or_else(|| score("act")),
            majors,
            locations,
            budget: field("budget").and_then(parse_budget),
        }
    }

    /// Pull what can be found from the raw message without a model
    pub fn from_message(message: &str) -> Self {
        let lowered = message.to_lowercase();
        let capture = |re: &Regex| {
            re.captures(message)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        Self {
            gpa: capture(&GPA_RE).and_then(|s| s.parse().ok()),
            sat_score: capture(&SAT_RE).and_then(|s| s.parse().ok()),
            act_score: capture(&ACT_RE).and_then(|s| s.parse().ok()),
            majors: match_aliases(&lowered, MAJOR_ALIASES),
            locations: match_aliases(&lowered, LOCATION_ALIASES),
            budget: budget_from_message(message),
        }
    }
}

/// Find a budget in free text
///
/// Numbers already read as a GPA or test score are skipped. A bare
/// comparison word ("under", "below") only introduces a budget when the
/// amount carries a currency sign or unit, or is large enough to be money.
fn budget_from_message(message: &str) -> Option<Budget> {
    let score_spans: Vec<std::ops::Range<usize>> = [&*GPA_RE, &*SAT_RE, &*ACT_RE]
        .into_iter()
        .flat_map(|re: &Regex| re.captures_iter(message))
        .filter_map(|c| c.get(1).map(|m| m.range()))
        .collect();

    BUDGET_RE.captures_iter(message).find_map(|captures| {
        let amount = captures.name("amount")?;
        if score_spans.iter().any(|span| span.start < amount.end() && amount.start() < span.end) {
            return None;
        }

        let keyword = captures.name("keyword")?.as_str().to_lowercase();
        let money = money_from_captures(&captures)?;
        let cued = MONEY_KEYWORDS.contains(&keyword.as_str())
            || captures.name("dollar").is_some()
            || captures.name("unit").is_some();

        if cued || money >= MIN_UNCUED_BUDGET {
            Budget::under(money)
        } else {
            None
        }
    })
}

/// Collect canonical names whose aliases appear in the message
fn match_aliases(lowered: &str, table: &[(&[&str], &str)]) -> Vec<String> {
    let mut found = Vec::new();
    for (aliases, canonical) in table {
        // "engineering" should not also be reported when a more specific engineering major matched
        let already_covered = found
            .iter()
            .any(|f: &String| f.to_lowercase().contains(&canonical.to_lowercase()));
        if already_covered {
            continue;
        }
        if aliases.iter().any(|alias| lowered.contains(alias)) {
            found.push(canonical.to_string());
        }
    }
    found
}

fn money_from_captures(captures: &regex::Captures<'_>) -> Option<f64> {
    let amount: f64 = captures.name("amount")?.as_str().replace(',', "").parse().ok()?;
    let multiplier = match captures.name("unit").map(|m| m.as_str().to_lowercase()) {
        Some(unit) if unit == "k" => 1_000.0,
        Some(unit) if unit == "万" => 10_000.0,
        _ => 1.0,
    };
    Some(amount * multiplier)
}

/// Parse free-form money text such as `"under 50000"`, `"$45k"` or `"5万"`
pub fn parse_money(text: &str) -> Option<f64> {
    MONEY_RE.captures(text).and_then(|c| money_from_captures(&c))
}

/// Accept a budget as an object, a bare number, or text
pub fn parse_budget(value: &Value) -> Option<Budget> {
    match value {
        Value::Object(map) => map
            .get("max_annual_tuition")
            .or_else(|| map.get("max"))
            .or_else(|| map.get("amount"))
            .and_then(|v| match v {
                Value::String(s) => parse_money(s),
                other => coerce_f64(other),
            })
            .and_then(Budget::under),
        Value::Number(n) => n.as_f64().and_then(Budget::under),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(inner @ Value::Object(_)) => parse_budget(&inner),
            _ => parse_money(s).and_then(Budget::under),
        },
        _ => None,
    }
}

/// Fold a delta into the profile
///
/// Numeric fields outside their valid range are dropped without touching
/// the stored value. Lists grow as case-insensitive unions. Absent values
/// never clear what is already known.
pub fn merge_profile(profile: &mut UserProfile, delta: ProfileDelta) {
    if let Some(gpa) = delta.gpa {
        if GPA_RANGE.contains(&gpa) {
            profile.gpa = Some(gpa);
        } else {
            tracing::debug!("Ignoring out-of-range GPA {}", gpa);
        }
    }

    if let Some(sat) = delta.sat_score {
        if SAT_RANGE.contains(&sat) {
            profile.sat_score = Some(sat);
        } else {
            tracing::debug!("Ignoring out-of-range SAT {}", sat);
        }
    }

    if let Some(act) = delta.act_score {
        if ACT_RANGE.contains(&act) {
            profile.act_score = Some(act);
        } else {
            tracing::debug!("Ignoring out-of-range ACT {}", act);
        }
    }

    merge_unique(&mut profile.major_preference, delta.majors);
    merge_unique(&mut profile.location_preference, delta.locations);

    if let Some(budget) = delta.budget {
        profile.budget = Some(budget);
    }
}
