use std::sync::Arc;
use stockscope::config::Config;
use stockscope::services::{CacheService, MarketDataService};
use stockscope::sources::{FinnhubClient, MarketDataProvider, UpstreamRouter, YahooFinanceClient};
use stockscope::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockscope=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting Stockscope server on {}:{}", config.host, config.port);

    // Connect the response cache. Never fails; an unreachable store means
    // every lookup misses.
    let cache = CacheService::connect(&config.cache).await;

    // Upstream providers
    let yahoo: Arc<dyn MarketDataProvider> = Arc::new(YahooFinanceClient::new(config.http_timeout)?);
    let finnhub: Option<Arc<dyn MarketDataProvider>> = match config.finnhub_api_key {
        Some(ref api_key) => {
            info!("Finnhub API key found, enabling quotes and company profiles");
            Some(Arc::new(FinnhubClient::new(api_key.clone(), config.http_timeout)?))
        }
        None => {
            warn!("FINNHUB_API_KEY not set, company profiles unavailable");
            None
        }
    };
    let provider = Arc::new(UpstreamRouter::new(yahoo, finnhub));

    let market = Arc::new(MarketDataService::new(
        cache.clone(),
        provider,
        config.search_result_limit,
    ));

    let state = AppState::new(config.clone(), cache.clone(), market);

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = stockscope::app(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Stockscope listening on {} (cache: {})",
        addr,
        if cache.is_connected() { "connected" } else { "disconnected" }
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down gracefully...");
    cache.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
