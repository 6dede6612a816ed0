//! Multi-source price aggregation
//!
//! Features:
//! - Concurrent fan-out to every registered price source
//! - Per-source and overall deadlines with a bounded grace window
//! - Short-TTL result cache with an injectable clock
//! - Symbol resolution from a built-in or remote token list

pub mod aggregator;
pub mod cache;
pub mod resolver;
pub mod sources;

pub use aggregator::{AggregatorStats, PriceAggregator, PriceAggregatorBuilder};
pub use cache::{CacheStats, Clock, Freshness, ManualClock, ResultCache, SystemClock};
pub use resolver::{StaticResolver, TokenListResolver, TokenResolver};
pub use sources::{build_sources, http_client, PriceSource};
