use crate::models::Intent;

const COLLEGE_MATCH_KEYWORDS: &[&str] = &[
    "college", "university", "universities", "school", "recommend", "match", "gpa", "sat",
    "act score", "major", "tuition", "budget", "admission", "apply", "applying", "ranking",
    "大学", "学校", "推荐", "选校", "申请", "专业", "成绩", "学费", "预算", "录取", "排名", "匹配",
];

const ESSAY_REVISE_KEYWORDS: &[&str] = &[
    "essay", "personal statement", "proofread", "revise", "rewrite", "draft", "writing",
    "文书", "作文", "个人陈述", "修改", "润色", "写作",
];

const SCHEDULE_PLAN_KEYWORDS: &[&str] = &[
    "deadline", "schedule", "timeline", "calendar", "plan", "due date", "when should",
    "截止", "日程", "时间表", "规划", "计划", "安排",
];

const GENERAL_QA_KEYWORDS: &[&str] = &[
    "what", "how", "why", "which", "explain", "difference", "?",
    "什么", "如何", "怎么", "为什么", "哪些", "区别", "吗", "？",
];

/// Count keyword occurrences in an already-lowercased message
fn keyword_score(message: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|kw| keyword_count(message, kw)).sum()
}

/// Occurrences of one keyword
///
/// ASCII keywords must not touch other ASCII letters, apart from a plural
/// `s`, so "plan" is not found in "explanation" but "SAT1450" still counts.
/// Other keywords are plain substrings.
fn keyword_count(message: &str, keyword: &str) -> usize {
    let is_word = keyword.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ');
    if !is_word {
        return message.matches(keyword).count();
    }

    let is_word_char = |c: char| c.is_ascii_alphabetic();
    message
        .match_indices(keyword)
        .filter(|(start, _)| {
            let before = message[..*start].chars().next_back();
            let after = &message[start + keyword.len()..];
            let after = after.strip_prefix('s').unwrap_or(after);
            !before.is_some_and(is_word_char) && !after.chars().next().is_some_and(is_word_char)
        })
        .count()
}

/// Keyword scores per intent, in tie-break order
pub fn intent_scores(message: &str) -> [(Intent, usize); 4] {
    let lowered = message.to_lowercase();

    [
        (Intent::CollegeMatch, keyword_score(&lowered, COLLEGE_MATCH_KEYWORDS)),
        (Intent::EssayRevise, keyword_score(&lowered, ESSAY_REVISE_KEYWORDS)),
        (Intent::SchedulePlan, keyword_score(&lowered, SCHEDULE_PLAN_KEYWORDS)),
        (Intent::GeneralQa, keyword_score(&lowered, GENERAL_QA_KEYWORDS)),
    ]
}

/// Classify a chat message
///
/// College matching wins whenever any of its keywords appear, and also when
/// nothing matched at all. Otherwise the highest-scoring intent wins, earlier
/// entries taking ties.
pub fn detect_intent(message: &str) -> Intent {
    let scores = intent_scores(message);
    let college_score = scores[0].1;

    if college_score > 0 || scores.iter().all(|(_, score)| *score == 0) {
        return Intent::CollegeMatch;
    }

    let mut best = scores[1];
    for candidate in &scores[2..] {
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }
    best.0
}
