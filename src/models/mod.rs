// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{UserProfile, Budget, BudgetKind, College, RawResult, SearchQueryParams, Intent, ScoringWeights};
pub use requests::InboundFrame;
pub use responses::{OutboundFrame, FrameType, HealthResponse, StatsResponse};
