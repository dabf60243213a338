//! Brings the host segment store in line with freshly generated
//! segments, one episode at a time.

use std::sync::Arc;

use futures::future::try_join_all;
use mediaskip_model::QueuedEpisode;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SkipError};
use crate::store::{SegmentGenerationRequest, SegmentProvider, SegmentStore};

/// Per-episode reconciliation: clear every stored segment, then write
/// the provider's fresh result set under our provenance tag.
///
/// Episodes are processed strictly sequentially; within one episode the
/// delete phase and the create phase each fan out against the store and
/// wait for every operation before moving on. Any failure inside one
/// episode's update is caught and logged, and the batch continues with
/// the next episode.
pub struct SegmentUpdateManager<S, P> {
    store: Arc<S>,
    provider: Arc<P>,
    provenance: String,
}

impl<S, P> std::fmt::Debug for SegmentUpdateManager<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentUpdateManager")
            .field("provenance", &self.provenance)
            .finish_non_exhaustive()
    }
}

impl<S, P> SegmentUpdateManager<S, P>
where
    S: SegmentStore,
    P: SegmentProvider,
{
    pub fn new(
        store: Arc<S>,
        provider: Arc<P>,
        provenance: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            provenance: provenance.into(),
        }
    }

    /// Update the stored segments of every episode in the batch.
    ///
    /// Per-episode failures are logged and swallowed; the only error
    /// this returns is [`SkipError::Cancelled`], raised at the top of
    /// the loop before any store call for the pending episode starts.
    pub async fn update_segments(
        &self,
        episodes: &[QueuedEpisode],
        cancellation: &CancellationToken,
    ) -> Result<()> {
        for episode in episodes {
            if cancellation.is_cancelled() {
                return Err(SkipError::Cancelled);
            }
            if let Err(error) = self.update_episode(episode).await {
                tracing::error!(
                    episode_id = %episode.episode_id,
                    error = %error,
                    "error processing episode"
                );
            }
        }
        Ok(())
    }

    async fn update_episode(&self, episode: &QueuedEpisode) -> Result<()> {
        let existing =
            self.store.list_segments(episode.episode_id).await?;
        try_join_all(
            existing
                .iter()
                .map(|segment| self.store.delete_segment(segment.id)),
        )
        .await?;

        let fresh = self
            .provider
            .generate(SegmentGenerationRequest {
                episode_id: episode.episode_id,
            })
            .await?;

        if fresh.is_empty() {
            tracing::debug!(
                episode_id = %episode.episode_id,
                "no segments found for episode"
            );
            return Ok(());
        }

        let created = try_join_all(fresh.iter().map(|segment| {
            self.store.create_segment(segment, &self.provenance)
        }))
        .await?;

        tracing::debug!(
            episode_id = %episode.episode_id,
            segments = created.len(),
            "updated segments for episode"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockSegmentProvider, MockSegmentStore};
    use async_trait::async_trait;
    use mediaskip_model::{
        AnalysisMode, EpisodeId, MediaSegment, SegmentId, SeriesId,
        StoredSegment,
    };
    use std::collections::BTreeMap;
    use std::collections::HashMap;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    fn episode_id(n: u128) -> EpisodeId {
        EpisodeId(Uuid::from_u128(n))
    }

    fn episode(n: u128) -> QueuedEpisode {
        QueuedEpisode::new(
            episode_id(n),
            SeriesId(Uuid::from_u128(0xee)),
            format!("Episode {n}"),
            format!("/media/series/e{n}.mkv"),
            1_500.0,
        )
        .unwrap()
    }

    fn segment(n: u128, start: f64, end: f64) -> MediaSegment {
        MediaSegment::new(
            episode_id(n),
            AnalysisMode::Introduction,
            start,
            end,
            1_500.0,
        )
        .unwrap()
    }

    /// State-backed store fake for assertions about final contents.
    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<BTreeMap<SegmentId, StoredSegment>>,
        fail_deletes: bool,
    }

    impl FakeStore {
        async fn seed(&self, segment: MediaSegment) -> SegmentId {
            let id = SegmentId::new();
            self.rows.lock().await.insert(
                id,
                StoredSegment {
                    id,
                    segment,
                    provenance: "elsewhere".to_string(),
                },
            );
            id
        }

        async fn rows_for(&self, episode_id: EpisodeId) -> Vec<StoredSegment> {
            self.rows
                .lock()
                .await
                .values()
                .filter(|row| row.segment.episode_id == episode_id)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl SegmentStore for FakeStore {
        async fn list_segments(
            &self,
            episode_id: EpisodeId,
        ) -> crate::error::Result<Vec<StoredSegment>> {
            Ok(self.rows_for(episode_id).await)
        }

        async fn delete_segment(
            &self,
            id: SegmentId,
        ) -> crate::error::Result<()> {
            if self.fail_deletes {
                return Err(SkipError::Store("delete refused".to_string()));
            }
            self.rows
                .lock()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| SkipError::NotFound(id.to_string()))
        }

        async fn create_segment(
            &self,
            segment: &MediaSegment,
            provenance: &str,
        ) -> crate::error::Result<StoredSegment> {
            let id = SegmentId::new();
            let stored = StoredSegment {
                id,
                segment: segment.clone(),
                provenance: provenance.to_string(),
            };
            self.rows.lock().await.insert(id, stored.clone());
            Ok(stored)
        }
    }

    /// Provider fake serving a fixed map, erroring for listed episodes.
    #[derive(Default)]
    struct FakeProvider {
        segments: HashMap<EpisodeId, Vec<MediaSegment>>,
        failing: Vec<EpisodeId>,
    }

    #[async_trait]
    impl SegmentProvider for FakeProvider {
        async fn generate(
            &self,
            request: SegmentGenerationRequest,
        ) -> crate::error::Result<Vec<MediaSegment>> {
            if self.failing.contains(&request.episode_id) {
                return Err(SkipError::Generation(
                    "provider exploded".to_string(),
                ));
            }
            Ok(self
                .segments
                .get(&request.episode_id)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn manager(
        store: Arc<FakeStore>,
        provider: FakeProvider,
    ) -> SegmentUpdateManager<FakeStore, FakeProvider> {
        SegmentUpdateManager::new(store, Arc::new(provider), "mediaskip")
    }

    #[tokio::test]
    async fn replaces_stale_segments_with_fresh_ones() {
        let store = Arc::new(FakeStore::default());
        store.seed(segment(1, 2.0, 20.0)).await;
        let provider = FakeProvider {
            segments: HashMap::from([(
                episode_id(1),
                vec![segment(1, 5.0, 35.0)],
            )]),
            ..Default::default()
        };
        let manager = manager(Arc::clone(&store), provider);

        manager
            .update_segments(&[episode(1)], &CancellationToken::new())
            .await
            .unwrap();

        let rows = store.rows_for(episode_id(1)).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].segment.start_secs, 5.0);
        assert_eq!(rows[0].segment.end_secs, 35.0);
        assert_eq!(rows[0].provenance, "mediaskip");
    }

    #[tokio::test]
    async fn empty_generation_clears_stale_segments() {
        let store = Arc::new(FakeStore::default());
        store.seed(segment(1, 2.0, 20.0)).await;
        store.seed(segment(1, 1_400.0, 1_460.0)).await;
        let manager = manager(Arc::clone(&store), FakeProvider::default());

        manager
            .update_segments(&[episode(1)], &CancellationToken::new())
            .await
            .unwrap();

        assert!(store.rows_for(episode_id(1)).await.is_empty());
    }

    #[tokio::test]
    async fn one_failing_episode_does_not_abort_the_batch() {
        let store = Arc::new(FakeStore::default());
        store.seed(segment(2, 3.0, 25.0)).await;
        let provider = FakeProvider {
            segments: HashMap::from([
                (episode_id(1), vec![segment(1, 5.0, 35.0)]),
                (episode_id(3), vec![segment(3, 4.0, 30.0)]),
            ]),
            failing: vec![episode_id(2)],
        };
        let manager = manager(Arc::clone(&store), provider);

        manager
            .update_segments(
                &[episode(1), episode(2), episode(3)],
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(store.rows_for(episode_id(1)).await.len(), 1);
        assert_eq!(store.rows_for(episode_id(3)).await.len(), 1);
        // Episode 2 was cleared before its generation failed; the spec
        // accepts that consequence of the delete-first ordering.
        assert!(store.rows_for(episode_id(2)).await.is_empty());
    }

    #[tokio::test]
    async fn delete_failure_is_contained_to_its_episode() {
        let store = Arc::new(FakeStore {
            fail_deletes: true,
            ..Default::default()
        });
        store.seed(segment(1, 2.0, 20.0)).await;
        let provider = FakeProvider {
            segments: HashMap::from([(
                episode_id(2),
                vec![segment(2, 5.0, 35.0)],
            )]),
            ..Default::default()
        };
        let manager = manager(Arc::clone(&store), provider);

        manager
            .update_segments(
                &[episode(1), episode(2)],
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        // Episode 1 keeps its stale row, episode 2 still updated.
        assert_eq!(store.rows_for(episode_id(1)).await.len(), 1);
        assert_eq!(store.rows_for(episode_id(2)).await.len(), 1);
    }

    #[tokio::test]
    async fn reconcile_is_idempotent_for_an_unchanged_result() {
        let store = Arc::new(FakeStore::default());
        let provider = FakeProvider {
            segments: HashMap::from([(
                episode_id(1),
                vec![segment(1, 5.0, 35.0), segment(1, 1_400.0, 1_460.0)],
            )]),
            ..Default::default()
        };
        let manager = manager(Arc::clone(&store), provider);
        let queue = [episode(1)];
        let cancellation = CancellationToken::new();

        manager.update_segments(&queue, &cancellation).await.unwrap();
        let mut first: Vec<(f64, f64)> = store
            .rows_for(episode_id(1))
            .await
            .iter()
            .map(|row| (row.segment.start_secs, row.segment.end_secs))
            .collect();
        first.sort_by(|a, b| a.0.total_cmp(&b.0));

        manager.update_segments(&queue, &cancellation).await.unwrap();
        let mut second: Vec<(f64, f64)> = store
            .rows_for(episode_id(1))
            .await
            .iter()
            .map(|row| (row.segment.start_secs, row.segment.end_secs))
            .collect();
        second.sort_by(|a, b| a.0.total_cmp(&b.0));

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn cancellation_aborts_before_any_store_call() {
        let store = MockSegmentStore::new();
        let provider = MockSegmentProvider::new();
        // No expectations set: any store or provider call would panic.
        let manager = SegmentUpdateManager::new(
            Arc::new(store),
            Arc::new(provider),
            "mediaskip",
        );
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let result = manager
            .update_segments(&[episode(1)], &cancellation)
            .await;

        assert!(matches!(result, Err(SkipError::Cancelled)));
    }

    #[tokio::test]
    async fn deletes_every_existing_segment_regardless_of_provenance() {
        let mut store = MockSegmentStore::new();
        let stale_a = StoredSegment {
            id: SegmentId(Uuid::from_u128(0x51)),
            segment: segment(1, 2.0, 20.0),
            provenance: "mediaskip".to_string(),
        };
        let stale_b = StoredSegment {
            id: SegmentId(Uuid::from_u128(0x52)),
            segment: segment(1, 1_400.0, 1_460.0),
            provenance: "somebody-else".to_string(),
        };
        store
            .expect_list_segments()
            .times(1)
            .returning(move |_| Ok(vec![stale_a.clone(), stale_b.clone()]));
        store
            .expect_delete_segment()
            .times(2)
            .returning(|_| Ok(()));
        let mut provider = MockSegmentProvider::new();
        provider
            .expect_generate()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let manager = SegmentUpdateManager::new(
            Arc::new(store),
            Arc::new(provider),
            "mediaskip",
        );
        manager
            .update_segments(&[episode(1)], &CancellationToken::new())
            .await
            .unwrap();
    }
}
