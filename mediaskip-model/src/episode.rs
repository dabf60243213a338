use std::path::PathBuf;

use crate::error::{ModelError, Result};
use crate::ids::{EpisodeId, SeriesId};

/// A unit of analysis work: one episode queued by the host scheduler.
///
/// Immutable once enqueued. The scheduler owns the queue for its
/// lifetime; analysis and reconciliation borrow entries by reference.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueuedEpisode {
    pub episode_id: EpisodeId,
    /// Series the episode belongs to, used to group candidates for
    /// cross-episode correlation.
    pub series_id: SeriesId,
    /// Display name, used in logs only.
    pub name: String,
    /// Path to the media content the fingerprint source reads.
    pub path: PathBuf,
    /// Total runtime in seconds.
    pub duration_secs: f64,
}

impl QueuedEpisode {
    pub fn new(
        episode_id: EpisodeId,
        series_id: SeriesId,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        duration_secs: f64,
    ) -> Result<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ModelError::InvalidEpisode(format!(
                "duration must be positive, got {duration_secs}"
            )));
        }
        Ok(Self {
            episode_id,
            series_id,
            name: name.into(),
            path: path.into(),
            duration_secs,
        })
    }
}
