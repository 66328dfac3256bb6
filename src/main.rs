use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use ob_match::config::Settings;
use ob_match::core::Ranker;
use ob_match::models::{PenaltyWeights, VulnerabilityWeights};
use ob_match::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use ob_match::services::{FeedbackStore, HospitalStore, RouteCache, RoutingClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(settings: &Settings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn io_error(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Configuration comes first so its logging section can be applied
    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io_error(format!("Configuration error: {}", e))
    })?;

    init_logging(&settings);

    info!("Starting obstetric hospital matching service...");

    let store = Arc::new(HospitalStore::new(
        &settings.dataset.path,
        settings.dataset.encodings.clone(),
        settings.dataset.seed_sample,
    ));

    info!(
        "Hospital dataset: {} (encodings: {:?})",
        settings.dataset.path, settings.dataset.encodings
    );

    let db_max_conn = settings.feedback.max_connections.unwrap_or(5);
    let feedback = Arc::new(
        FeedbackStore::new(&settings.feedback.database_url, db_max_conn)
            .await
            .map_err(|e| {
                error!("Failed to open feedback database: {}", e);
                io_error(format!("Feedback database error: {}", e))
            })?,
    );

    info!("Feedback store initialized (max: {} connections)", db_max_conn);

    let route_cache = RouteCache::new(settings.routing.cache_size, settings.routing.cache_ttl_secs);
    let routing = RoutingClient::new(
        settings.routing.endpoint.clone(),
        settings.routing_api_key(),
        Duration::from_secs(settings.routing.timeout_secs),
    )
    .map_err(|e| {
        error!("Failed to build routing client: {}", e);
        io_error(format!("Routing client error: {}", e))
    })?
    .with_cache(route_cache);

    if !routing.is_configured() {
        warn!("Routing API key not configured, route lookups will report unavailable");
    }

    let weights = PenaltyWeights::from(&settings.scoring.penalties);
    let ranker = Ranker::new(weights);

    info!("Ranker initialized with weights: {:?}", weights);

    let app_state = AppState {
        store,
        feedback,
        routing: Arc::new(routing),
        ranker,
        vulnerability: VulnerabilityWeights::from(&settings.scoring.vulnerability),
        default_top_n: settings.ranking.default_top_n,
        max_top_n: settings.ranking.max_top_n,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let max_upload_bytes = settings.ranking.max_upload_bytes;

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PayloadConfig::new(max_upload_bytes))
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
