//! Hashing and small formatting helpers shared across the orchestrator crates.

use crate::types::TranscriptionConfig;
use crate::Result;

/// Compute the MD5 digest of `bytes`, rendered as a lowercase hex string.
#[must_use]
pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// A canonical, order-independent signature of externally supplied timestamp
/// records, used as the second half of the cache key alongside the VAD
/// signature when external timestamps drive segmentation.
#[must_use]
pub fn timestamps_signature(records: &[(f64, f64, Option<String>)]) -> String {
    let rendered = records
        .iter()
        .map(|(start, end, spk)| format!("{start}:{end}:{}", spk.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join(";");
    md5_hex(rendered.as_bytes())
}

/// Compute the stable cache key for a piece of audio content under a given
/// pre-processing configuration.
///
/// The hash input is `md5(audio_bytes)` combined with `md5(canonical
/// vad-or-timestamps signature json)`, so any change to VAD parameters (or to
/// the supplied timestamps) invalidates prior cache entries automatically.
///
/// # Errors
///
/// Returns an error if the config's VAD signature cannot be serialized, which
/// cannot happen for this type under normal conditions.
pub fn content_hash(
    audio_bytes: &[u8],
    config: &TranscriptionConfig,
    external_timestamps: Option<&[(f64, f64, Option<String>)]>,
) -> Result<String> {
    let audio_digest = md5_hex(audio_bytes);
    let config_digest = match external_timestamps {
        Some(records) => timestamps_signature(records),
        None => md5_hex(config.vad_signature_json()?.as_bytes()),
    };
    Ok(format!("{audio_digest}{config_digest}"))
}

/// Format a duration in seconds as `MM:SS.mmm`, used in logs and VTT/SRT
/// rendering helpers downstream.
#[must_use]
pub fn format_duration_mmss(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{minutes:02}:{secs:02}.{millis:03}")
}

/// Segmentation statistics over a sequence of sub-segment durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    /// Sum of all durations.
    pub total: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Minimum duration.
    pub min: f64,
    /// Maximum duration.
    pub max: f64,
}

impl DurationStats {
    /// Compute stats over a slice of durations in seconds.
    ///
    /// Returns all-zero stats for an empty slice.
    #[must_use]
    pub fn from_durations(durations: &[f64]) -> Self {
        if durations.is_empty() {
            return Self {
                total: 0.0,
                mean: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        let total: f64 = durations.iter().sum();
        let mean = total / durations.len() as f64;
        let min = durations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { total, mean, min, max }
    }
}
