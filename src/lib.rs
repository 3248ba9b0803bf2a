//! UniGuide - conversational college recommendation service
//!
//! This library provides the recommendation pipeline behind the UniGuide chat
//! assistant: cached multi-provider search, tolerant extraction of college
//! records from model output, weighted fit scoring and the per-connection
//! conversation agent.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{calculate_fit_score, detect_intent, Recommendation, Recommender};
pub use models::{College, Intent, RawResult, ScoringWeights, SearchQueryParams, UserProfile};
pub use services::{Agent, AgentServices, Oracle, SearchChain};
