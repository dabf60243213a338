use std::fmt;

use crate::error::{ModelError, Result};
use crate::ids::{EpisodeId, SegmentId};

/// Which temporal region class a detection pass searches for. Doubles as
/// the kind tag on detected segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnalysisMode {
    /// Shared opening near the start of the episode.
    Introduction,
    /// Shared end-credits near the tail of the episode.
    Credits,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Introduction => write!(f, "introduction"),
            AnalysisMode::Credits => write!(f, "credits"),
        }
    }
}

/// A detected region of one episode: introduction or credits.
///
/// Carries no id; ids belong to [`StoredSegment`] and are assigned by
/// the segment store at creation time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaSegment {
    pub episode_id: EpisodeId,
    pub kind: AnalysisMode,
    pub start_secs: f64,
    pub end_secs: f64,
}

impl MediaSegment {
    /// Build a segment, enforcing `start < end` and both bounds within
    /// `[0, episode_duration_secs]`.
    pub fn new(
        episode_id: EpisodeId,
        kind: AnalysisMode,
        start_secs: f64,
        end_secs: f64,
        episode_duration_secs: f64,
    ) -> Result<Self> {
        if !start_secs.is_finite() || !end_secs.is_finite() {
            return Err(ModelError::InvalidSegment(format!(
                "non-finite bounds [{start_secs}, {end_secs}]"
            )));
        }
        if start_secs < 0.0 || end_secs > episode_duration_secs {
            return Err(ModelError::InvalidSegment(format!(
                "bounds [{start_secs}, {end_secs}] outside episode runtime [0, {episode_duration_secs}]"
            )));
        }
        if start_secs >= end_secs {
            return Err(ModelError::InvalidSegment(format!(
                "start {start_secs} is not before end {end_secs}"
            )));
        }
        Ok(Self {
            episode_id,
            kind,
            start_secs,
            end_secs,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

impl fmt::Display for MediaSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:.2}s, {:.2}s]",
            self.kind, self.start_secs, self.end_secs
        )
    }
}

/// A segment as persisted by the store: the detection payload plus the
/// store-assigned id and the provenance tag of whichever producer wrote
/// it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredSegment {
    pub id: SegmentId,
    pub segment: MediaSegment,
    pub provenance: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        let err = MediaSegment::new(
            EpisodeId::new(),
            AnalysisMode::Introduction,
            30.0,
            10.0,
            1200.0,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidSegment(_)));
    }

    #[test]
    fn rejects_bounds_outside_runtime() {
        assert!(
            MediaSegment::new(
                EpisodeId::new(),
                AnalysisMode::Credits,
                1100.0,
                1300.0,
                1200.0,
            )
            .is_err()
        );
        assert!(
            MediaSegment::new(
                EpisodeId::new(),
                AnalysisMode::Credits,
                -1.0,
                30.0,
                1200.0,
            )
            .is_err()
        );
    }

    #[test]
    fn accepts_well_formed_segment() {
        let segment = MediaSegment::new(
            EpisodeId::new(),
            AnalysisMode::Introduction,
            5.0,
            35.0,
            1200.0,
        )
        .unwrap();
        assert_eq!(segment.duration_secs(), 30.0);
    }
}
