//! Stockscope - market data cache and technical indicator server

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use config::Config;
use services::{CacheService, MarketDataService};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<CacheService>,
    pub market: Arc<MarketDataService>,
}

impl AppState {
    pub fn new(config: Arc<Config>, cache: Arc<CacheService>, market: Arc<MarketDataService>) -> Self {
        Self {
            config,
            cache,
            market,
        }
    }
}

/// Build the full HTTP application for `state`.
pub fn app(state: AppState) -> axum::Router {
    api::router().with_state(state)
}

// Re-export commonly used types
pub use types::*;
