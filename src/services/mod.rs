// Service exports
pub mod agent;
pub mod cache;
pub mod extractor;
pub mod oracle;
pub mod registry;
pub mod search;
pub mod seed;

pub use agent::{Agent, AgentConfig, AgentError, AgentServices};
pub use cache::{CacheEntry, CacheKey, CacheStats, SearchCache};
pub use extractor::{ExtractionError, RecordExtractor};
pub use oracle::{ChatMessage, ChatRole, OpenAiOracle, Oracle, OracleError, OracleRequest};
pub use registry::{ConnectionHandle, ConnectionRegistry, RegistryError};
pub use search::{BraveSearch, DuckDuckGoSearch, SearchChain, SearchError, SearchProvider, StaticDatasetSearch};
pub use seed::seed_colleges;
