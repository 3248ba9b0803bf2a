use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

use uniguide::config::Settings;
use uniguide::core::Recommender;
use uniguide::models::ScoringWeights;
use uniguide::routes::{self, chat::AppState};
use uniguide::services::{
    seed_colleges, AgentServices, BraveSearch, ConnectionRegistry, DuckDuckGoSearch, OpenAiOracle,
    SearchCache, SearchChain, SearchProvider, StaticDatasetSearch,
};

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load()
        .and_then(|s| s.validate().map(|_| s))
        .map_err(|e| {
            eprintln!("Configuration error: {}", e);
            std::io::Error::other(format!("Configuration error: {}", e))
        })?;

    init_logging(&settings);

    info!("Starting UniGuide college recommendation service...");
    info!("Configuration loaded successfully");

    // Oracle client; validate() guarantees the key is present
    let oracle = OpenAiOracle::new(
        settings.oracle.endpoint.clone(),
        settings.oracle.api_key.clone().unwrap_or_default(),
        settings.oracle.model.clone(),
        settings.oracle.timeout(),
        settings.oracle.max_retries,
        settings.oracle.retry_backoff(),
    )
    .map_err(|e| startup_error("Failed to create oracle client", e))?;

    info!("Oracle client initialized (model: {})", settings.oracle.model);

    // Search providers in priority order
    let seeds: Arc<[uniguide::models::College]> = seed_colleges().into();
    let search_timeout = settings.search.timeout();

    let brave = BraveSearch::new(
        settings.search.brave_endpoint.clone(),
        settings.search.brave_api_key.clone(),
        search_timeout,
    )
    .map_err(|e| startup_error("Failed to create Brave client", e))?;
    if !brave.has_credential() {
        info!("No Brave API key configured, Brave search will be skipped");
    }

    let duckduckgo = DuckDuckGoSearch::new(settings.search.duckduckgo_endpoint.clone(), search_timeout)
        .map_err(|e| startup_error("Failed to create DuckDuckGo client", e))?;

    let providers: Vec<Arc<dyn SearchProvider>> = vec![
        Arc::new(brave),
        Arc::new(duckduckgo),
        Arc::new(StaticDatasetSearch::new(seeds.clone())),
    ];

    let cache = Arc::new(SearchCache::new(Duration::from_secs(settings.cache.ttl_secs)));
    info!("Search cache initialized (TTL: {}s)", settings.cache.ttl_secs);

    let chain = Arc::new(SearchChain::new(providers, cache, search_timeout));
    info!("Search chain: {:?}", chain.provider_names());

    // Recommender with configured weights
    let weights = ScoringWeights::from(&settings.scoring.weights);
    let recommender = Arc::new(Recommender::new(weights, settings.agent.recommendation_limit));

    info!("Recommender initialized with weights: {:?}", weights);

    let registry = Arc::new(ConnectionRegistry::new(
        settings.connections.max_connections,
        Duration::from_secs(settings.connections.idle_timeout_secs),
    ));

    // Periodically close idle chat connections
    let sweeper_registry = registry.clone();
    let sweep_interval = Duration::from_secs(settings.connections.sweep_interval_secs.max(1));
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            sweeper_registry.sweep(Instant::now());
        }
    });

    // Build application state
    let app_state = AppState {
        services: AgentServices {
            oracle: Arc::new(oracle),
            chain,
            recommender,
            seeds,
            config: settings.agent_config(),
        },
        registry,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
