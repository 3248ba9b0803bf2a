//! Per-connection conversation agent.
//!
//! Each message goes through profile extraction, intent detection and one of
//! four handlers. Every path ends in a reply string; failures become a
//! localized apology.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::extraction::parse_object;
use crate::core::filters::filter_by_params;
use crate::core::intent::detect_intent;
use crate::core::matcher::Recommender;
use crate::core::profile::{merge_profile, ProfileDelta};
use crate::core::report::{profile_summary, render_report, NO_RESULTS_ADVICE, PROGRESS_STEPS};
use crate::models::{College, Intent, OutboundFrame, SearchQueryParams, UserProfile};
use crate::services::extractor::{direct_colleges, RecordExtractor};
use crate::services::oracle::{ChatMessage, Oracle, OracleError, OracleRequest};
use crate::services::search::SearchChain;

const ASSISTANT_INSTRUCTION: &str = "You are UniGuide AI, a helpful college admissions assistant. \
Provide accurate, helpful information about college admissions, applications, essays, deadlines \
and related topics. Be encouraging and supportive. Keep responses conversational but informative. \
If you don't know something specific, suggest consulting official sources or a guidance counselor.";

const PROFILE_INSTRUCTION: &str = r#"Extract the student's academic profile from the message. Return only a JSON object with these keys, using null for anything not mentioned:
{"gpa": number (0-4), "sat_score": integer (400-1600), "act_score": integer (1-36), "interests": [intended majors in English], "location_preference": [states, regions or cities in English], "budget": {"max_annual_tuition": number, "type": "under"}}"#;

const PROFILE_TEMPERATURE: f32 = 0.1;
const PROFILE_MAX_TOKENS: u32 = 300;
const QA_TEMPERATURE: f32 = 0.7;
const QA_MAX_TOKENS: u32 = 500;

const ESSAY_REPLY: &str = "📝 **Essay assistance is coming soon!** For now, focus on your personal story and the experiences only you can tell. Would you like college recommendations instead?";

const SCHEDULE_REPLY: &str = "📅 **Schedule planning is coming soon!** Meanwhile, most early decision deadlines fall on November 1st and regular decision deadlines are typically January 1st.";

const APOLOGY_EN: &str = "Sorry, something went wrong while processing your request. Please try again or ask a different question.";
const APOLOGY_ZH: &str = "抱歉，处理您的请求时出现了问题。请稍后再试，或者换个问题问我。";

/// Errors that can end a message handler early
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Oracle failed: {0}")]
    Oracle(#[from] OracleError),
}

/// Conversation limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentConfig {
    /// History entries sent along with an open question
    pub history_window: usize,
    /// History entries kept per conversation
    pub max_history: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_window: 4,
            max_history: 10,
        }
    }
}

/// Shared services every agent draws on
#[derive(Clone)]
pub struct AgentServices {
    pub oracle: Arc<dyn Oracle>,
    pub chain: Arc<SearchChain>,
    pub recommender: Arc<Recommender>,
    pub seeds: Arc<[College]>,
    pub config: AgentConfig,
}

/// Conversation state for one connection
pub struct Agent {
    services: AgentServices,
    extractor: RecordExtractor,
    profile: UserProfile,
    history: Vec<ChatMessage>,
    status: Option<UnboundedSender<OutboundFrame>>,
}

/// Whether text contains CJK ideographs
pub fn contains_cjk(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}'))
}

/// Apology in the language of the message
pub fn apology_for(message: &str) -> &'static str {
    if contains_cjk(message) {
        APOLOGY_ZH
    } else {
        APOLOGY_EN
    }
}

impl Agent {
    pub fn new(services: AgentServices) -> Self {
        Self {
            extractor: RecordExtractor::new(services.oracle.clone()),
            services,
            profile: UserProfile::default(),
            history: Vec::new(),
            status: None,
        }
    }

    /// Send progress narration through this channel
    pub fn with_status_channel(mut self, status: UnboundedSender<OutboundFrame>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Handle one chat message and produce the reply
    pub async fn process_message(&mut self, message: &str) -> String {
        let intent = detect_intent(message);
        tracing::info!("Processing message ({} chars) as {:?}", message.chars().count(), intent);

        let outcome = match intent {
            Intent::CollegeMatch => Ok(self.process_college_match(message).await),
            Intent::EssayRevise => Ok(ESSAY_REPLY.to_string()),
            Intent::SchedulePlan => Ok(SCHEDULE_REPLY.to_string()),
            Intent::GeneralQa => self.process_general_qa(message).await,
        };

        let reply = outcome.unwrap_or_else(|e| {
            tracing::error!("Failed to process message: {}", e);
            apology_for(message).to_string()
        });

        self.record_turn(message, &reply);
        reply
    }

    fn record_turn(&mut self, message: &str, reply: &str) {
        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::assistant(reply));

        let max = self.services.config.max_history;
        if self.history.len() > max {
            let excess = self.history.len() - max;
            self.history.drain(..excess);
        }
    }

    fn send_status(&self, text: &str) {
        if let Some(status) = &self.status {
            // The session may already be gone
            let _ = status.send(OutboundFrame::status(text));
        }
    }

    async fn process_college_match(&mut self, message: &str) -> String {
        self.send_status(PROGRESS_STEPS[0]);
        let delta = self.extract_profile_delta(message).await;
        merge_profile(&mut self.profile, delta);

        self.send_status(PROGRESS_STEPS[1]);
        let params = SearchQueryParams::from_profile(&self.profile);
        let query = params.to_query();
        let results = self.services.chain.search_universities(&query).await;

        let (colleges, extraction_failed) = match direct_colleges(&results) {
            Some(direct) if !direct.is_empty() => (direct, false),
            _ => match self.extractor.extract(&results).await {
                Ok(extracted) if !extracted.is_empty() => (extracted, false),
                Ok(_) => (filter_by_params(&self.services.seeds, &params), false),
                Err(e) => {
                    tracing::warn!("Record extraction failed, using built-in dataset: {}", e);
                    (filter_by_params(&self.services.seeds, &params), true)
                }
            },
        };

        if colleges.is_empty() {
            tracing::info!("No colleges found for '{}'", query);
            if extraction_failed {
                if let Ok(advice) = self.profile_advice().await {
                    return format!(
                        "## 🎓 College Recommendations\n\n{}\n\nI couldn't find college data for your profile right now. Here is some general guidance instead:\n\n{}",
                        profile_summary(&self.profile),
                        advice
                    );
                }
            }
            return NO_RESULTS_ADVICE.to_string();
        }

        self.send_status(PROGRESS_STEPS[2]);
        let recommendation = self.services.recommender.recommend(&self.profile, colleges);

        self.send_status(PROGRESS_STEPS[3]);
        tracing::info!(
            "Recommending {} of {} colleges for '{}'",
            recommendation.colleges.len(),
            recommendation.total_candidates,
            query
        );
        render_report(&self.profile, &recommendation)
    }

    /// Ask the oracle for profile facts, falling back to pattern matching
    async fn extract_profile_delta(&self, message: &str) -> ProfileDelta {
        let request = OracleRequest::new(PROFILE_INSTRUCTION, vec![ChatMessage::user(message)])
            .temperature(PROFILE_TEMPERATURE)
            .max_tokens(PROFILE_MAX_TOKENS);

        match self.services.oracle.complete(&request).await {
            Ok(text) => match parse_object(&text) {
                Ok(map) => {
                    let delta = ProfileDelta::from_json(&map);
                    if !delta.is_empty() {
                        return delta;
                    }
                }
                Err(e) => tracing::warn!("Unparseable profile extraction: {}", e),
            },
            Err(e) => tracing::warn!("Profile extraction failed: {}", e),
        }

        ProfileDelta::from_message(message)
    }

    async fn profile_advice(&self) -> Result<String, AgentError> {
        let fmt_opt = |v: Option<String>| v.unwrap_or_else(|| "unknown".to_string());
        let question = format!(
            "I'm looking for college recommendations with GPA {}, SAT {}, interested in {}",
            fmt_opt(self.profile.gpa.map(|g| g.to_string())),
            fmt_opt(self.profile.sat_score.map(|s| s.to_string())),
            if self.profile.major_preference.is_empty() {
                "anything".to_string()
            } else {
                self.profile.major_preference.join(", ")
            }
        );

        self.process_general_qa(&question).await
    }

    async fn process_general_qa(&self, message: &str) -> Result<String, AgentError> {
        let window = self.services.config.history_window;
        let start = self.history.len().saturating_sub(window);

        let mut messages: Vec<ChatMessage> = self.history[start..].to_vec();
        messages.push(ChatMessage::user(message));

        let request = OracleRequest::new(ASSISTANT_INSTRUCTION, messages)
            .temperature(QA_TEMPERATURE)
            .max_tokens(QA_MAX_TOKENS);

        Ok(self.services.oracle.complete(&request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FrameType;
    use crate::services::cache::SearchCache;
    use crate::services::search::{SearchProvider, StaticDatasetSearch};
    use crate::services::seed::seed_colleges;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Fails profile extraction, answers everything else with a fixed string
    struct QaOracle {
        seen: Mutex<Vec<OracleRequest>>,
    }

    #[async_trait]
    impl Oracle for QaOracle {
        async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError> {
            self.seen.lock().push(request.clone());
            if request.system == PROFILE_INSTRUCTION {
                return Err(OracleError::Timeout);
            }
            Ok("Early decision is binding.".to_string())
        }
    }

    fn services(oracle: Arc<dyn Oracle>) -> AgentServices {
        let seeds: Arc<[College]> = seed_colleges().into();
        let providers: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(StaticDatasetSearch::new(seeds.clone()))];
        AgentServices {
            oracle,
            chain: Arc::new(SearchChain::new(providers, Arc::new(SearchCache::default()), Duration::from_secs(5))),
            recommender: Arc::new(Recommender::default()),
            seeds,
            config: AgentConfig::default(),
        }
    }

    #[test]
    fn test_apology_language() {
        assert_eq!(apology_for("我的GPA是3.8"), APOLOGY_ZH);
        assert_eq!(apology_for("my gpa is 3.8"), APOLOGY_EN);
    }

    #[tokio::test]
    async fn test_heuristic_fallback_and_progress() {
        let oracle = Arc::new(QaOracle { seen: Mutex::new(Vec::new()) });
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut agent = Agent::new(services(oracle)).with_status_channel(tx);

        let reply = agent.process_message("My GPA is 3.9 and I love computer science").await;

        assert_eq!(agent.profile().gpa, Some(3.9));
        assert_eq!(agent.profile().major_preference, vec!["Computer Science"]);
        assert!(reply.contains("% match"));

        let mut steps = 0;
        while let Ok(frame) = rx.try_recv() {
            assert_eq!(frame.frame_type, FrameType::StatusUpdate);
            steps += 1;
        }
        assert_eq!(steps, 4);
    }

    #[tokio::test]
    async fn test_general_qa_uses_recent_history() {
        let oracle = Arc::new(QaOracle { seen: Mutex::new(Vec::new()) });
        let mut agent = Agent::new(services(oracle.clone()));

        for i in 0..3 {
            agent.process_message(&format!("Please proofread essay {}", i)).await;
        }
        let reply = agent.process_message("What is early decision?").await;
        assert_eq!(reply, "Early decision is binding.");

        let seen = oracle.seen.lock();
        let qa = seen.last().unwrap();
        assert_eq!(qa.system, ASSISTANT_INSTRUCTION);
        assert_eq!(qa.messages.len(), 5);
        assert_eq!(qa.messages[0].content, "Please proofread essay 1");
        assert_eq!(qa.last_user_message(), Some("What is early decision?"));
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let oracle = Arc::new(QaOracle { seen: Mutex::new(Vec::new()) });
        let mut agent = Agent::new(services(oracle));

        for _ in 0..8 {
            agent.process_message("Help me plan my deadlines").await;
        }
        assert_eq!(agent.history().len(), 10);
        assert_eq!(agent.history()[9].content, SCHEDULE_REPLY);
    }
}
