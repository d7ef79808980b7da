//! The snapshot differencing and emerging-signal detection engine.
//!
//! Every function in this crate is a pure, synchronous transformation over
//! already-collected data: each takes the current week's records and an
//! optional prior [`Snapshot`](trendbrief_core::Snapshot) and returns a
//! value, with no ambient state, no I/O, and no clock access. Baseline runs
//! (no usable prior snapshot) suppress all cross-run comparison by design —
//! no signal is ever manufactured from a single observation.

pub mod brief;
pub mod decline;
pub mod dedup;
pub mod delta;
pub mod emerging;
pub mod fingerprint;
pub mod theme;

pub use brief::{assemble_brief, BriefInputs, EngagementConfig};
pub use decline::{detect_declining_signals, DeclineConfig};
pub use dedup::tag_posts;
pub use delta::compute_deltas;
pub use emerging::{detect_emerging_signals, DetectorConfig};
pub use fingerprint::{normalize_question, title_terms, topic_fingerprint};
pub use theme::{select_theme, ThemeConfig};
