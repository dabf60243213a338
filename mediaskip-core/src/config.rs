use anyhow::Context;
use mediaskip_model::AnalysisMode;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

/// Source that produced the detection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetectionConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
}

/// Tuning for the shared-segment analyzer plus the provenance tag the
/// reconciler stamps on every segment it writes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Producer name written as provenance on every stored segment.
    /// Distinguishes our rows from externally supplied ones.
    pub provenance: String,
    /// Minimum fraction of matching points inside a candidate run for
    /// the run to count as a detection. Raise to cut false positives on
    /// series with repetitive scoring; lower if real intros with heavy
    /// dialogue overlap are being missed.
    pub similarity_threshold: f64,
    /// Maximum number of differing bits (0..=32) between two hash
    /// points that still counts as a point match.
    pub hash_bit_threshold: u32,
    /// Seconds of each episode's head searched in Introduction mode.
    pub introduction_window_secs: f64,
    /// Seconds of each episode's tail searched in Credits mode.
    pub credits_window_secs: f64,
    /// Shortest introduction worth reporting, in seconds.
    pub min_introduction_secs: f64,
    /// Shortest credits roll worth reporting, in seconds.
    pub min_credits_secs: f64,
    /// Consecutive non-matching points tolerated inside a matching run
    /// before the run is considered broken.
    pub max_run_gap: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            provenance: "mediaskip".to_string(),
            similarity_threshold: 0.8,
            hash_bit_threshold: 10,
            introduction_window_secs: 600.0,
            credits_window_secs: 360.0,
            min_introduction_secs: 15.0,
            min_credits_secs: 15.0,
            max_run_gap: 2,
        }
    }
}

impl DetectionConfig {
    /// Search window length for the given mode.
    pub fn window_secs(&self, mode: AnalysisMode) -> f64 {
        match mode {
            AnalysisMode::Introduction => self.introduction_window_secs,
            AnalysisMode::Credits => self.credits_window_secs,
        }
    }

    /// Minimum reportable segment duration for the given mode.
    pub fn min_duration_secs(&self, mode: AnalysisMode) -> f64 {
        match mode {
            AnalysisMode::Introduction => self.min_introduction_secs,
            AnalysisMode::Credits => self.min_credits_secs,
        }
    }

    /// Load detection configuration overrides using environment
    /// variables. Evaluation order:
    /// 1) `$MEDIASKIP_CONFIG_PATH` (JSON file),
    /// 2) `$MEDIASKIP_CONFIG_JSON` (inline JSON),
    /// 3) defaults if neither is set.
    pub fn load_from_env() -> anyhow::Result<(Self, DetectionConfigSource)> {
        if let Ok(path_str) = env::var("MEDIASKIP_CONFIG_PATH")
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str.trim());
            let raw = fs::read_to_string(&path).with_context(|| {
                format!("reading detection config from {}", path.display())
            })?;
            let config = serde_json::from_str(&raw).with_context(|| {
                format!("parsing detection config from {}", path.display())
            })?;
            return Ok((config, DetectionConfigSource::EnvPath(path)));
        }

        if let Ok(inline) = env::var("MEDIASKIP_CONFIG_JSON")
            && !inline.trim().is_empty()
        {
            let config = serde_json::from_str(inline.trim())
                .context("parsing inline detection config")?;
            return Ok((config, DetectionConfigSource::EnvInline));
        }

        Ok((Self::default(), DetectionConfigSource::Default))
    }
}
