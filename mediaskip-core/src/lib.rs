//! Detection of recurring non-content segments (introductions and
//! end-credits) shared across episodes of a series, and reconciliation
//! of the detected time ranges with a host segment store.
//!
//! Two components make up the pipeline:
//!
//! 1. [`SharedSegmentAnalyzer`]: correlates fingerprints across the
//!    episodes of a series and finalizes the best-known segment per
//!    episode into a [`DetectionSink`]. Episodes that could not be
//!    analyzed come back as data, never as an error.
//! 2. [`SegmentUpdateManager`]: per episode, clears stale store entries
//!    and writes freshly generated segments, isolating failures so one
//!    bad episode never aborts the batch.
//!
//! Fingerprint extraction, the segment store, and the scheduler that
//! supplies the queue are external collaborators consumed through the
//! traits in [`fingerprint`] and [`store`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod reconcile;
pub mod store;

pub use analysis::{MediaFileAnalyzer, SharedSegmentAnalyzer};
pub use config::{DetectionConfig, DetectionConfigSource};
pub use error::{Result, SkipError};
pub use fingerprint::{Fingerprint, FingerprintSource};
pub use reconcile::SegmentUpdateManager;
pub use store::{
    DetectionSink, InMemoryDetectionStore, SegmentGenerationRequest,
    SegmentProvider, SegmentStore,
};
