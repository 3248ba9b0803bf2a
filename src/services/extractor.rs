use std::fmt::Write;
use std::sync::Arc;
use thiserror::Error;

use crate::core::extraction::{parse_colleges, ParseError};
use crate::models::{College, RawResult};
use crate::services::oracle::{ChatMessage, Oracle, OracleError, OracleRequest};

/// Maximum number of search results sent to the oracle
pub const MAX_RESULTS_FOR_EXTRACTION: usize = 8;

const EXTRACTION_TEMPERATURE: f32 = 0.1;
const EXTRACTION_MAX_TOKENS: u32 = 2000;

const EXTRACTION_INSTRUCTION: &str = r#"You are a university data extraction expert. Extract structured information about universities and colleges from the provided search results.

For each university mentioned, extract:
- name: full university name
- location: city, state or country
- ranking: national ranking, if mentioned
- tuition: annual tuition in USD, if mentioned
- acceptance_rate: acceptance rate as a decimal (0.15 for 15%)
- avg_sat: average SAT score, if mentioned
- avg_gpa: average GPA, if mentioned
- majors: list of strong or notable programs
- description: one sentence on key strengths

Return only a JSON array. Omit fields you cannot find.

Example:
[{"name": "Stanford University", "location": "Stanford, CA", "ranking": 5, "tuition": 56000, "acceptance_rate": 0.04, "avg_sat": 1520, "avg_gpa": 3.9, "majors": ["Computer Science", "Engineering"], "description": "Private research university known for technology programs"}]"#;

/// Errors that can occur while turning search results into colleges
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Oracle failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("Could not parse oracle output: {0}")]
    Parse(#[from] ParseError),
}

/// Turns raw search results into validated college records
pub struct RecordExtractor {
    oracle: Arc<dyn Oracle>,
}

impl RecordExtractor {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Extract valid colleges from search results
    ///
    /// Results that already carry structured data are used as-is. Otherwise
    /// the first few results are sent to the oracle and its answer parsed.
    pub async fn extract(&self, results: &[RawResult]) -> Result<Vec<College>, ExtractionError> {
        if results.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(direct) = direct_colleges(results) {
            tracing::debug!("Using {} structured records directly", direct.len());
            return Ok(direct);
        }

        let request = OracleRequest::new(
            EXTRACTION_INSTRUCTION,
            vec![ChatMessage::user(format!(
                "Extract university data from these search results:\n\n{}",
                render_results(results)
            ))],
        )
        .temperature(EXTRACTION_TEMPERATURE)
        .max_tokens(EXTRACTION_MAX_TOKENS);

        let response = self.oracle.complete(&request).await?;
        let colleges = parse_colleges(&response)?;

        tracing::info!("Extracted {} colleges from {} search results", colleges.len(), results.len());
        Ok(colleges)
    }
}

/// Structured records carried by the results, if there are any
pub fn direct_colleges(results: &[RawResult]) -> Option<Vec<College>> {
    if !results.iter().any(|r| r.college_data.is_some()) {
        return None;
    }

    Some(
        results
            .iter()
            .filter_map(|r| r.college_data.clone())
            .filter(College::is_valid)
            .collect(),
    )
}

/// Render results as Title/Description/URL blocks for the oracle
pub fn render_results(results: &[RawResult]) -> String {
    let mut text = String::new();
    for result in results.iter().take(MAX_RESULTS_FOR_EXTRACTION) {
        let _ = write!(
            text,
            "Title: {}\nDescription: {}\nURL: {}\n\n",
            result.title, result.snippet, result.url
        );
    }
    text
}
