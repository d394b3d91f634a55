pub mod config;
pub mod counter;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod ranker;
pub mod refresh;
pub mod service;
pub mod source;
pub mod statistics;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::{Config, Credentials, RefreshInterval, StatsLimits};
pub use error::{Result, TagStatsError};
pub use filter::{FilterParams, FilterRange, LeadFilter, Period};
pub use ranker::AggregatedTag;
pub use refresh::RefreshTask;
pub use service::TagStatsService;
pub use source::LeadSource;
pub use statistics::TagStatistics;
