//! Shared domain types and configuration for the trendbrief pipeline.
//!
//! Everything downstream — the snapshot store, the differencing engine, the
//! collectors, and the CLI — speaks the record types defined here. The crate
//! has no I/O beyond reading configuration.

pub mod app_config;
pub mod config;
pub mod error;
pub mod types;
pub mod watchlist;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use types::{
    Brief, DecliningSignal, DeltaRecord, EmergingSignal, EngagementCandidate, IncomingPost,
    KeywordMetrics, KeywordSeries, NewsItem, PostRecord, PostTag, SignalSource, Snapshot,
    SnapshotSummary, SourceKind, SourceOutcome, SourceReport, ThemeSelection, ThemeSource,
    TrendDirection,
};
pub use watchlist::{load_watchlist, Watchlist};
