//! Contract with the fingerprint extraction collaborator.
//!
//! Extraction itself is a black box; all this crate relies on is a
//! comparable representation per search window: a sequence of `u32`
//! hash points at a fixed period, compared by Hamming distance.

use async_trait::async_trait;
use mediaskip_model::{AnalysisMode, QueuedEpisode};

use crate::error::{Result, SkipError};

/// Comparable representation of one episode's search window.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    /// One hash point per `period_secs` of the window, in time order.
    pub points: Vec<u32>,
    /// Seconds covered by each point.
    pub period_secs: f64,
    /// Offset of the window within the episode. Zero for Introduction
    /// windows; near the tail for Credits windows.
    pub window_start_secs: f64,
}

impl Fingerprint {
    pub fn new(
        points: Vec<u32>,
        period_secs: f64,
        window_start_secs: f64,
    ) -> Result<Self> {
        if !period_secs.is_finite() || period_secs <= 0.0 {
            return Err(SkipError::Fingerprint(format!(
                "point period must be positive, got {period_secs}"
            )));
        }
        if !window_start_secs.is_finite() || window_start_secs < 0.0 {
            return Err(SkipError::Fingerprint(format!(
                "window start must be non-negative, got {window_start_secs}"
            )));
        }
        Ok(Self {
            points,
            period_secs,
            window_start_secs,
        })
    }

    pub fn window_duration_secs(&self) -> f64 {
        self.points.len() as f64 * self.period_secs
    }

    /// Episode time at which the point at `index` begins.
    pub fn time_at(&self, index: usize) -> f64 {
        self.window_start_secs + index as f64 * self.period_secs
    }
}

/// Produces the comparable representation of one episode's search
/// window for a mode. Implemented outside this crate (e.g. on top of a
/// decoder); errors surface as per-episode analysis failures.
#[async_trait]
pub trait FingerprintSource: Send + Sync {
    async fn fingerprint(
        &self,
        episode: &QueuedEpisode,
        mode: AnalysisMode,
        window_secs: f64,
    ) -> Result<Fingerprint>;
}
