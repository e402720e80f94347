pub mod cache;
pub mod connection;
pub mod market_data;
pub mod memory_store;
pub mod redis_store;
pub mod signals;
pub mod single_flight;

pub use cache::{CacheService, CacheStatus};
pub use connection::{ConnectionEvent, ConnectionState, ConnectionStatus};
pub use market_data::MarketDataService;
pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
pub use single_flight::SingleFlight;
