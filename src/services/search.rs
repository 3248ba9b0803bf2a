use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{College, RawResult};
use crate::services::cache::{CacheKey, SearchCache};

/// Default Brave Search API base URL
pub const BRAVE_ENDPOINT: &str = "https://api.search.brave.com";
/// Default DuckDuckGo instant-answer API base URL
pub const DUCKDUCKGO_ENDPOINT: &str = "https://api.duckduckgo.com";
/// Default per-provider time limit
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

const BRAVE_QUERY_SUFFIX: &str = "university college admission requirements tuition";
const BRAVE_RESULT_COUNT: u32 = 10;
const DUCKDUCKGO_MAX_TOPICS: usize = 8;

/// Words that carry no signal when matching the built-in dataset
const STOPWORDS: &[&str] = &[
    "programs", "program", "in", "and", "the", "of", "for", "top", "universities", "university",
    "colleges", "college", "admission", "requirements", "tuition", "ranking", "best", "school",
    "schools",
];

/// Errors that can occur when querying a search provider
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search timed out after {0:?}")]
    Timeout(Duration),

    #[error("API returned error: {0}")]
    Api(String),

    #[error("Missing credential for {0}")]
    MissingCredential(&'static str),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// A source of raw search results
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<RawResult>, SearchError>;
}

fn http_client(timeout: Duration) -> Result<Client, SearchError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Brave web search API client
pub struct BraveSearch {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
}

impl BraveSearch {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: http_client(timeout)?,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    fn name(&self) -> &str {
        "brave"
    }

    async fn search(&self, query: &str) -> Result<Vec<RawResult>, SearchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredential("brave"))?;

        let full_query = format!("{} {}", query, BRAVE_QUERY_SUFFIX);
        let url = format!(
            "{}/res/v1/web/search?q={}&count={}&search_lang=en&country=US",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&full_query),
            BRAVE_RESULT_COUNT
        );

        tracing::debug!("Brave search: {}", full_query);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Api(format!("Brave search failed: {}", response.status())));
        }

        let body: BraveResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("Failed to parse Brave response: {}", e)))?;

        let results = body
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .map(|r| RawResult::new(r.title, r.description, r.url))
            .collect();

        Ok(results)
    }
}

/// DuckDuckGo instant-answer API client
pub struct DuckDuckGoSearch {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct DuckDuckGoResponse {
    #[serde(rename = "Abstract", default)]
    summary: String,
    #[serde(rename = "AbstractURL", default)]
    summary_url: String,
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<DuckDuckGoTopic>,
}

// Topic groups carry neither field and are skipped
#[derive(Debug, Deserialize)]
struct DuckDuckGoTopic {
    #[serde(rename = "Text", default)]
    text: Option<String>,
    #[serde(rename = "FirstURL", default)]
    first_url: Option<String>,
}

impl DuckDuckGoSearch {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            base_url,
            client: http_client(timeout)?,
        })
    }
}

/// Title for a related topic, taken from the last path segment of its URL
pub fn title_from_topic_url(url: &str) -> String {
    let segment = url.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    decoded.replace('_', " ")
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Result<Vec<RawResult>, SearchError> {
        let url = format!(
            "{}/?q={}&format=json&no_html=1&skip_disambig=1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        );

        tracing::debug!("DuckDuckGo search: {}", query);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SearchError::Api(format!("DuckDuckGo search failed: {}", response.status())));
        }

        let body: DuckDuckGoResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("Failed to parse DuckDuckGo response: {}", e)))?;

        let mut results = Vec::with_capacity(1 + DUCKDUCKGO_MAX_TOPICS);

        if !body.summary.trim().is_empty() {
            let title = if body.heading.trim().is_empty() {
                query.to_string()
            } else {
                body.heading
            };
            results.push(RawResult::new(title, body.summary, body.summary_url));
        }

        results.extend(
            body.related_topics
                .into_iter()
                .filter_map(|topic| {
                    let text = topic.text.filter(|t| !t.trim().is_empty())?;
                    let url = topic.first_url.unwrap_or_default();
                    Some(RawResult::new(title_from_topic_url(&url), text, url))
                })
                .take(DUCKDUCKGO_MAX_TOPICS),
        );

        Ok(results)
    }
}

/// Meaningful lowercase tokens of a query
pub fn query_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Provider backed by the built-in college dataset
///
/// Results carry `college_data`, so they skip model extraction.
pub struct StaticDatasetSearch {
    colleges: Arc<[College]>,
}

impl StaticDatasetSearch {
    pub fn new(colleges: Arc<[College]>) -> Self {
        Self { colleges }
    }

    /// Colleges whose text contains any meaningful query token
    pub fn lookup(&self, query: &str) -> Vec<College> {
        let tokens = query_tokens(query);
        if tokens.is_empty() {
            return self.colleges.to_vec();
        }

        self.colleges
            .iter()
            .filter(|college| {
                let text = college.search_text();
                tokens.iter().any(|t| text.contains(t.as_str()))
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SearchProvider for StaticDatasetSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str) -> Result<Vec<RawResult>, SearchError> {
        Ok(self.lookup(query).into_iter().map(RawResult::from_college).collect())
    }
}

/// Ordered provider chain with a shared result cache
pub struct SearchChain {
    providers: Vec<Arc<dyn SearchProvider>>,
    cache: Arc<SearchCache>,
    timeout: Duration,
}

impl SearchChain {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>, cache: Arc<SearchCache>, timeout: Duration) -> Self {
        Self {
            providers,
            cache,
            timeout,
        }
    }

    pub fn cache(&self) -> &Arc<SearchCache> {
        &self.cache
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Search for universities, trying each provider in priority order
    ///
    /// An error, a timeout or an empty list moves on to the next provider.
    /// The first non-empty result is cached and returned. If every provider
    /// fails the result is empty.
    pub async fn search_universities(&self, query: &str) -> Vec<RawResult> {
        let key = CacheKey::search(query);

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Search cache hit for '{}' ({} results)", key, cached.len());
            return cached;
        }

        for provider in &self.providers {
            let outcome = match tokio::time::timeout(self.timeout, provider.search(query)).await {
                Ok(result) => result,
                Err(_) => Err(SearchError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(results) if !results.is_empty() => {
                    tracing::info!("Provider {} returned {} results for '{}'", provider.name(), results.len(), query);
                    self.cache.set(&key, results.clone()).await;
                    return results;
                }
                Ok(_) => {
                    tracing::debug!("Provider {} returned no results for '{}'", provider.name(), query);
                }
                Err(SearchError::MissingCredential(name)) => {
                    tracing::debug!("Skipping {}: no credential configured", name);
                }
                Err(e) => {
                    tracing::warn!("Provider {} failed for '{}': {}", provider.name(), query, e);
                }
            }
        }

        tracing::warn!("All search providers failed for '{}'", query);
        Vec::new()
    }
}
