use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mediaskip_model::{
    AnalysisMode, EpisodeId, MediaSegment, QueuedEpisode, SeriesId,
};
use tokio_util::sync::CancellationToken;

use crate::analysis::MediaFileAnalyzer;
use crate::analysis::correlation::{self, Alignment, MatchParams};
use crate::config::DetectionConfig;
use crate::fingerprint::{Fingerprint, FingerprintSource};
use crate::store::DetectionSink;

/// Detects segments shared across the episodes of a series by
/// correlating their fingerprints pairwise.
///
/// Works series by series: fingerprints every episode of a bucket,
/// then picks, per episode, the peer alignment with the most matching
/// points above the confidence gate. Confirmed detections are
/// finalized into the sink; everything else lands in the returned
/// failure list.
pub struct SharedSegmentAnalyzer<F, S> {
    fingerprints: Arc<F>,
    sink: Arc<S>,
    config: DetectionConfig,
}

impl<F, S> std::fmt::Debug for SharedSegmentAnalyzer<F, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSegmentAnalyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<F, S> SharedSegmentAnalyzer<F, S>
where
    F: FingerprintSource,
    S: DetectionSink,
{
    pub fn new(
        fingerprints: Arc<F>,
        sink: Arc<S>,
        config: DetectionConfig,
    ) -> Self {
        Self {
            fingerprints,
            sink,
            config,
        }
    }

    fn match_params(&self, mode: AnalysisMode, period_secs: f64) -> MatchParams {
        let min_run_points = (self.config.min_duration_secs(mode)
            / period_secs)
            .ceil() as usize;
        MatchParams {
            bit_threshold: self.config.hash_bit_threshold,
            min_run_points: min_run_points.max(1),
            max_run_gap: self.config.max_run_gap,
            min_density: self.config.similarity_threshold,
        }
    }

    /// Best alignment of one episode against all of its siblings.
    fn best_peer_alignment(
        probe: &Fingerprint,
        probe_index: usize,
        printed: &[(&QueuedEpisode, Fingerprint)],
        params: &MatchParams,
    ) -> Option<Alignment> {
        let mut best: Option<Alignment> = None;
        for (peer_index, (_, peer)) in printed.iter().enumerate() {
            if peer_index == probe_index {
                continue;
            }
            if let Some(candidate) =
                correlation::best_alignment(&probe.points, &peer.points, params)
                && correlation::prefer(&candidate, best.as_ref())
            {
                best = Some(candidate);
            }
        }
        best
    }

    async fn finalize(
        &self,
        episode: &QueuedEpisode,
        mode: AnalysisMode,
        print: &Fingerprint,
        alignment: Alignment,
    ) -> bool {
        let start = print.time_at(alignment.run_start);
        let end = print
            .time_at(alignment.run_end + 1)
            .min(episode.duration_secs);
        let segment = match MediaSegment::new(
            episode.episode_id,
            mode,
            start,
            end,
            episode.duration_secs,
        ) {
            Ok(segment) => segment,
            Err(error) => {
                tracing::warn!(
                    episode_id = %episode.episode_id,
                    error = %error,
                    "discarding malformed detection"
                );
                return false;
            }
        };
        tracing::debug!(
            episode_id = %episode.episode_id,
            segment = %segment,
            density = alignment.density,
            "confirmed shared segment"
        );
        match self.sink.record(segment).await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(
                    episode_id = %episode.episode_id,
                    error = %error,
                    "failed to record detection"
                );
                false
            }
        }
    }
}

#[async_trait]
impl<F, S> MediaFileAnalyzer for SharedSegmentAnalyzer<F, S>
where
    F: FingerprintSource,
    S: DetectionSink,
{
    async fn analyze(
        &self,
        queue: &[QueuedEpisode],
        mode: AnalysisMode,
        cancellation: &CancellationToken,
    ) -> Vec<QueuedEpisode> {
        let mut finalized: HashSet<EpisodeId> = HashSet::new();
        let window_secs = self.config.window_secs(mode);

        for (series_id, episodes) in bucket_by_series(queue) {
            if episodes.len() < 2 {
                tracing::debug!(
                    series_id = %series_id,
                    "insufficient comparison set, skipping series"
                );
                continue;
            }

            let mut printed: Vec<(&QueuedEpisode, Fingerprint)> =
                Vec::with_capacity(episodes.len());
            for &episode in &episodes {
                if cancellation.is_cancelled() {
                    tracing::debug!(
                        mode = %mode,
                        "analysis cancelled, failing remaining episodes"
                    );
                    return unfinished(queue, &finalized);
                }
                match self
                    .fingerprints
                    .fingerprint(episode, mode, window_secs)
                    .await
                {
                    Ok(print) => printed.push((episode, print)),
                    Err(error) => tracing::warn!(
                        episode_id = %episode.episode_id,
                        error = %error,
                        "fingerprint extraction failed"
                    ),
                }
            }

            for (index, (episode, print)) in printed.iter().enumerate() {
                if cancellation.is_cancelled() {
                    tracing::debug!(
                        mode = %mode,
                        "analysis cancelled, failing remaining episodes"
                    );
                    return unfinished(queue, &finalized);
                }
                let params = self.match_params(mode, print.period_secs);
                let Some(alignment) =
                    Self::best_peer_alignment(print, index, &printed, &params)
                else {
                    tracing::debug!(
                        episode_id = %episode.episode_id,
                        mode = %mode,
                        "no qualifying match among siblings"
                    );
                    continue;
                };
                if self.finalize(episode, mode, print, alignment).await {
                    finalized.insert(episode.episode_id);
                }
            }
        }

        unfinished(queue, &finalized)
    }
}

/// Group the queue by series, preserving queue order inside and across
/// buckets. The queue arrives pre-grouped from the scheduler; this is
/// defensive bucketing, not sorting.
fn bucket_by_series(
    queue: &[QueuedEpisode],
) -> Vec<(SeriesId, Vec<&QueuedEpisode>)> {
    let mut buckets: Vec<(SeriesId, Vec<&QueuedEpisode>)> = Vec::new();
    for episode in queue {
        match buckets
            .iter_mut()
            .find(|(series_id, _)| *series_id == episode.series_id)
        {
            Some((_, episodes)) => episodes.push(episode),
            None => buckets.push((episode.series_id, vec![episode])),
        }
    }
    buckets
}

/// Everything in the queue that has not been finalized, in queue order.
fn unfinished(
    queue: &[QueuedEpisode],
    finalized: &HashSet<EpisodeId>,
) -> Vec<QueuedEpisode> {
    queue
        .iter()
        .filter(|episode| !finalized.contains(&episode.episode_id))
        .cloned()
        .collect()
}
