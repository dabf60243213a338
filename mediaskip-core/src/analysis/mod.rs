//! Shared-segment analysis: finds introductions and credits that recur
//! across the episodes of a series.

mod correlation;
mod shared;

pub use shared::SharedSegmentAnalyzer;

use async_trait::async_trait;
use mediaskip_model::{AnalysisMode, QueuedEpisode};
use tokio_util::sync::CancellationToken;

/// Analyze a batch of episodes for shared introductions or credits.
#[async_trait]
pub trait MediaFileAnalyzer: Send + Sync {
    /// Returns the episodes that were **not** successfully analyzed.
    ///
    /// Every episode absent from the returned list has had its
    /// best-known segment for `mode` finalized. Expected misses
    /// (extraction errors, insufficient comparison sets, no qualifying
    /// match) come back as entries here, never as a panic or error
    /// that aborts the batch. When `cancellation` fires, processing
    /// stops and every not-yet-completed episode is reported failed.
    async fn analyze(
        &self,
        queue: &[QueuedEpisode],
        mode: AnalysisMode,
        cancellation: &CancellationToken,
    ) -> Vec<QueuedEpisode>;
}
