// Core algorithm exports
pub mod extraction;
pub mod filters;
pub mod intent;
pub mod matcher;
pub mod normalize;
pub mod profile;
pub mod report;
pub mod scoring;

pub use extraction::{parse_colleges, parse_object, ParseError};
pub use filters::{apply_budget_filter, filter_by_params, BudgetFiltered};
pub use intent::detect_intent;
pub use matcher::{Recommendation, Recommender, DEFAULT_RECOMMENDATION_LIMIT};
pub use profile::{merge_profile, ProfileDelta};
pub use report::render_report;
pub use scoring::calculate_fit_score;
