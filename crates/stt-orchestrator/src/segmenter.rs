//! Audio segmenter (§4.A): transcode the uploaded file to canonical PCM, then
//! cut it into VAD-bounded sub-segments (or honor externally supplied
//! timestamps), writing each piece as its own wave file alongside the
//! original.
//!
//! `split` is pure CPU + blocking file I/O (the suspension point named in
//! §5); callers run it via `tokio::task::spawn_blocking`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use hound::{SampleFormat, WavSpec, WavWriter};
use tokio::process::Command;
use webrtc_vad::{SampleRate, Vad, VadMode};

use stt_core::types::VadConfig;
use stt_core::Result;

use crate::OrchestratorError;

const SAMPLE_RATE_HZ: u32 = 16_000;
const FRAME_DURATION_SECONDS: f64 = 0.03;
const FRAME_SIZE_SAMPLES: usize = 480; // 30ms @ 16kHz

/// One sub-segment produced by [`split`]: its file path, its start offset
/// relative to the canonical file, and its duration, all in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SubSegment {
    /// Path to the sub-segment's wave file.
    pub path: PathBuf,
    /// Offset from the start of the canonical file, in seconds.
    pub offset: f64,
    /// Duration of this sub-segment, in seconds.
    pub duration: f64,
}

/// Aggregate statistics over a [`split`] result's durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStats {
    /// Total audio duration across all sub-segments, in seconds.
    pub total: f64,
    /// Mean sub-segment duration, in seconds.
    pub mean: f64,
    /// Shortest sub-segment duration, in seconds.
    pub min: f64,
    /// Longest sub-segment duration, in seconds.
    pub max: f64,
}

impl SegmentStats {
    fn from_durations(durations: &[f64]) -> Self {
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

/// Transcode `path` to 16-bit PCM, mono, 16 kHz via the external `ffmpeg`
/// binary, deleting the original on success.
///
/// # Errors
///
/// Returns [`stt_core::Error::TranscodingFailed`] if the transcoder process
/// could not be spawned, exited with a failure status, or produced no output
/// file.
pub async fn transcode(ffmpeg_path: &str, path: &Path) -> Result<PathBuf> {
    let output_path = path.with_extension("canonical.wav");

    let status = Command::new(ffmpeg_path)
        .args(["-y", "-i"])
        .arg(path)
        .args(["-acodec", "pcm_s16le", "-ac", "1", "-ar", "16000"])
        .arg(&output_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| OrchestratorError::transcoding(path, e.to_string()))?;

    if !status.success() || !output_path.exists() {
        return Err(OrchestratorError::transcoding(
            path,
            "transcoder did not produce an output file",
        )
        .into());
    }

    tokio::fs::remove_file(path)
        .await
        .map_err(|e| OrchestratorError::transcoding(path, e.to_string()))?;

    Ok(output_path)
}

/// Split the canonical wave file at `path` into ordered sub-segments per
/// §4.A's four segmentation modes, returning the sub-segments plus summary
/// statistics over their durations.
///
/// When `external_timestamps` is `Some`, segmentation mode 1 (external
/// timestamps) is used unconditionally regardless of `vad_config`.
///
/// # Errors
///
/// Returns [`stt_core::Error::TranscodingFailed`] if `path` cannot be read as
/// a wave file, or an I/O error if a sub-segment cannot be written.
pub fn split(
    path: &Path,
    vad_config: &VadConfig,
    external_timestamps: Option<&[(f64, f64, Option<String>)]>,
    min_silence_seconds: f64,
    min_length_seconds: f64,
) -> Result<(Vec<SubSegment>, SegmentStats)> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| OrchestratorError::transcoding(path, e.to_string()))?;
    let spec = reader.spec();
    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| OrchestratorError::transcoding(path, e.to_string()))?;
    let sample_rate = spec.sample_rate;
    let total_duration = samples.len() as f64 / f64::from(sample_rate);

    let boundaries = if let Some(timestamps) = external_timestamps {
        boundaries_from_timestamps(timestamps, total_duration)
    } else if !vad_config.enable_vad {
        vec![0.0, total_duration]
    } else {
        let candidates = vad_cut_candidates(&samples, sample_rate)?;
        if total_duration < min_length_seconds || candidates.is_empty() {
            vec![0.0, total_duration]
        } else {
            bound_segments(
                &candidates,
                total_duration,
                vad_config.min_duration,
                vad_config.max_duration,
            )
        }
    };

    write_sub_segments(path, spec, &samples, sample_rate, &boundaries)
}

fn boundaries_from_timestamps(
    timestamps: &[(f64, f64, Option<String>)],
    total_duration: f64,
) -> Vec<f64> {
    let mut sorted: Vec<f64> = timestamps.iter().map(|(start, _, _)| *start).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted.dedup();
    if sorted.first() != Some(&0.0) {
        sorted.insert(0, 0.0);
    }
    sorted.push(total_duration);
    sorted
}

/// Frame the PCM samples into 30ms chunks and run the WebRTC VAD over each,
/// returning the midpoint (in seconds) of every silence run long enough to
/// qualify as a cut candidate.
fn vad_cut_candidates(samples: &[i16], sample_rate: u32) -> Result<Vec<f64>> {
    let vad_rate = match sample_rate {
        8_000 => SampleRate::Rate8kHz,
        16_000 => SampleRate::Rate16kHz,
        32_000 => SampleRate::Rate32kHz,
        48_000 => SampleRate::Rate48kHz,
        other => {
            return Err(OrchestratorError::transcoding(
                PathBuf::new(),
                format!("unsupported sample rate for VAD: {other}Hz"),
            )
            .into())
        }
    };
    let mut vad = Vad::new_with_rate_and_mode(vad_rate, VadMode::LowBitrate);

    let mut candidates = Vec::new();
    let mut silence_run_start: Option<usize> = None;

    for (frame_idx, frame) in samples.chunks(FRAME_SIZE_SAMPLES).enumerate() {
        if frame.len() != FRAME_SIZE_SAMPLES {
            break;
        }
        let is_speech = vad.is_voice_segment(frame).unwrap_or(true);
        if is_speech {
            if let Some(run_start) = silence_run_start.take() {
                record_candidate_if_long_enough(&mut candidates, run_start, frame_idx, FRAME_DURATION_SECONDS);
            }
        } else if silence_run_start.is_none() {
            silence_run_start = Some(frame_idx);
        }
    }
    if let Some(run_start) = silence_run_start {
        let total_frames = samples.len() / FRAME_SIZE_SAMPLES;
        record_candidate_if_long_enough(&mut candidates, run_start, total_frames, FRAME_DURATION_SECONDS);
    }

    Ok(candidates)
}

fn record_candidate_if_long_enough(
    candidates: &mut Vec<f64>,
    run_start_frame: usize,
    run_end_frame: usize,
    frame_duration: f64,
) {
    let run_seconds = (run_end_frame - run_start_frame) as f64 * frame_duration;
    if run_seconds >= 0.6 {
        let mid_frame = (run_start_frame + run_end_frame) as f64 / 2.0;
        candidates.push(mid_frame * frame_duration);
    }
}

/// Apply the two post-filters from §4.A to a raw cut-candidate list: merge
/// forward any piece shorter than `min_duration`, and force a cut at the last
/// skipped candidate whenever the accumulating piece would otherwise exceed
/// `max_duration`.
fn bound_segments(
    candidates: &[f64],
    total_duration: f64,
    min_duration: f64,
    max_duration: Option<f64>,
) -> Vec<f64> {
    let mut boundaries = vec![0.0];
    let mut segment_start = 0.0;
    let mut pending_candidate: Option<f64> = None;

    for &candidate in candidates {
        if let Some(max) = max_duration {
            if candidate - segment_start > max {
                let forced_cut = pending_candidate.unwrap_or(candidate);
                if forced_cut > segment_start {
                    boundaries.push(forced_cut);
                    segment_start = forced_cut;
                    pending_candidate = None;
                }
            }
        }

        if candidate - segment_start >= min_duration {
            boundaries.push(candidate);
            segment_start = candidate;
            pending_candidate = None;
        } else {
            pending_candidate = Some(candidate);
        }
    }

    if *boundaries.last().unwrap_or(&0.0) < total_duration {
        boundaries.push(total_duration);
    }
    boundaries
}

fn write_sub_segments(
    canonical_path: &Path,
    spec: WavSpec,
    samples: &[i16],
    sample_rate: u32,
    boundaries: &[f64],
) -> Result<(Vec<SubSegment>, SegmentStats)> {
    let stem = canonical_path
        .file_stem()
        .map_or_else(|| "segment".to_string(), |s| s.to_string_lossy().to_string());
    let parent = canonical_path.parent().unwrap_or_else(|| Path::new("."));

    let mut segments = Vec::with_capacity(boundaries.len().saturating_sub(1));
    let mut durations = Vec::with_capacity(segments.capacity());

    for (index, window) in boundaries.windows(2).enumerate() {
        let (start, end) = (window[0], window[1]);
        let start_sample = (start * f64::from(sample_rate)) as usize;
        let end_sample = ((end * f64::from(sample_rate)) as usize).min(samples.len());
        if end_sample <= start_sample {
            continue;
        }

        let sub_path = parent.join(format!("{stem}_{index:03}.wav"));
        let write_spec = WavSpec {
            channels: spec.channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&sub_path, write_spec)
            .map_err(|e| OrchestratorError::transcoding(&sub_path, e.to_string()))?;
        for &sample in &samples[start_sample..end_sample] {
            writer
                .write_sample(sample)
                .map_err(|e| OrchestratorError::transcoding(&sub_path, e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| OrchestratorError::transcoding(&sub_path, e.to_string()))?;

        let duration = (end_sample - start_sample) as f64 / f64::from(sample_rate);
        durations.push(duration);
        segments.push(SubSegment {
            path: sub_path,
            offset: start,
            duration,
        });
    }

    if segments.is_empty() {
        let duration = samples.len() as f64 / f64::from(sample_rate);
        segments.push(SubSegment {
            path: canonical_path.to_path_buf(),
            offset: 0.0,
            duration,
        });
        durations.push(duration);
    }

    let stats = SegmentStats::from_durations(&durations);
    Ok((segments, stats))
}
