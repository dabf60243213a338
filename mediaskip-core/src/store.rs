//! Ports to the host application's segment machinery.
//!
//! [`SegmentStore`] and [`SegmentProvider`] are consumed, never
//! implemented, by this crate; the host wires in its persistence and
//! generation backends. [`DetectionSink`] is the side channel the
//! analyzer finalizes confirmed detections into, with
//! [`InMemoryDetectionStore`] as the in-process implementation that
//! also serves those detections back as a provider.

use std::collections::HashMap;

use async_trait::async_trait;
use mediaskip_model::{EpisodeId, MediaSegment, SegmentId, StoredSegment};
use tokio::sync::RwLock;

use crate::error::Result;

/// Request for freshly generated segments of one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentGenerationRequest {
    pub episode_id: EpisodeId,
}

/// The host's persistent segment store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// All stored segments for one episode, any kind, any provenance.
    async fn list_segments(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Vec<StoredSegment>>;

    /// Delete one stored segment. Unknown ids are an error, not a
    /// silent no-op.
    async fn delete_segment(&self, id: SegmentId) -> Result<()>;

    /// Persist a segment under the given provenance tag, returning it
    /// with its store-assigned id.
    async fn create_segment(
        &self,
        segment: &MediaSegment,
        provenance: &str,
    ) -> Result<StoredSegment>;
}

/// Supplies the current best-known segments for one episode. May
/// legitimately return an empty set; failures surface as errors the
/// reconciler catches per episode.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentProvider: Send + Sync {
    async fn generate(
        &self,
        request: SegmentGenerationRequest,
    ) -> Result<Vec<MediaSegment>>;
}

/// Receives confirmed detections from the analyzer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DetectionSink: Send + Sync {
    async fn record(&self, segment: MediaSegment) -> Result<()>;
}

/// In-process detection cache: the analyzer records into it, the
/// reconciler's provider reads out of it.
///
/// Recording a detection replaces any previous detection of the same
/// kind for that episode; detections of the other kind are kept, so an
/// Introduction pass never clobbers Credits results.
#[derive(Debug, Default)]
pub struct InMemoryDetectionStore {
    detections: RwLock<HashMap<EpisodeId, Vec<MediaSegment>>>,
}

impl InMemoryDetectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached detections, e.g. ahead of a full re-scan.
    pub async fn clear(&self) {
        self.detections.write().await.clear();
    }
}

#[async_trait]
impl DetectionSink for InMemoryDetectionStore {
    async fn record(&self, segment: MediaSegment) -> Result<()> {
        let mut detections = self.detections.write().await;
        let entry = detections.entry(segment.episode_id).or_default();
        entry.retain(|existing| existing.kind != segment.kind);
        entry.push(segment);
        Ok(())
    }
}

#[async_trait]
impl SegmentProvider for InMemoryDetectionStore {
    async fn generate(
        &self,
        request: SegmentGenerationRequest,
    ) -> Result<Vec<MediaSegment>> {
        let detections = self.detections.read().await;
        Ok(detections
            .get(&request.episode_id)
            .cloned()
            .unwrap_or_default())
    }
}
