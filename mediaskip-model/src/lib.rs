//! Core data model definitions shared across mediaskip crates.

pub mod episode;
pub mod error;
pub mod ids;
pub mod segment;

// Intentionally curated re-exports for downstream consumers.
pub use episode::QueuedEpisode;
pub use error::{ModelError, Result as ModelResult};
pub use ids::{EpisodeId, SegmentId, SeriesId};
pub use segment::{AnalysisMode, MediaSegment, StoredSegment};
