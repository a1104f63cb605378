//! Render a persisted result per the negotiated `Accept` header (component H):
//! raw JSON, the speaker-prefixed plain-text transcript, or a timestamped
//! WebVTT/SRT cue list built from `segments`.

use std::fmt::Write as _;

use stt_core::types::{FinalResultDocument, FinalResultSegment};

/// The result formats the `/results/{id}` contract supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    /// `application/json`: the raw [`FinalResultDocument`].
    Json,
    /// `text/plain`: `final_transcription`, i.e. `transcription_result`.
    Text,
    /// `text/vtt`: WebVTT cues, one per segment.
    Vtt,
    /// `text/srt`: SubRip cues, one per segment.
    Srt,
}

impl ResultFormat {
    /// Negotiate a format from an `Accept` header value.
    ///
    /// Returns `None` for any value other than the four supported media
    /// types, which the caller should map onto a 400 response.
    #[must_use]
    pub fn from_accept_header(accept: &str) -> Option<Self> {
        let accept = accept.split(',').next().unwrap_or(accept).trim();
        match accept {
            "application/json" | "*/*" | "" => Some(Self::Json),
            "text/plain" => Some(Self::Text),
            "text/vtt" => Some(Self::Vtt),
            "text/srt" => Some(Self::Srt),
            _ => None,
        }
    }

    /// The `Content-Type` header value this format should be served under.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Text => "text/plain",
            Self::Vtt => "text/vtt",
            Self::Srt => "text/srt",
        }
    }
}

/// Render `document` per `format`. JSON rendering never fails to serialize
/// `FinalResultDocument` (it contains no non-finite floats by construction);
/// callers treat the `Result` as infallible in practice.
#[must_use]
pub fn render(document: &FinalResultDocument, format: ResultFormat) -> String {
    match format {
        ResultFormat::Json => {
            serde_json::to_string(document).unwrap_or_else(|_| "{}".to_string())
        }
        ResultFormat::Text => document.transcription_result.clone(),
        ResultFormat::Vtt => render_vtt(document),
        ResultFormat::Srt => render_srt(document),
    }
}

fn render_vtt(document: &FinalResultDocument) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for segment in &document.segments {
        let _ = writeln!(
            out,
            "{} --> {}\n{}\n",
            vtt_timestamp(segment.start),
            vtt_timestamp(segment.end),
            cue_text(segment)
        );
    }
    out
}

fn render_srt(document: &FinalResultDocument) -> String {
    let mut out = String::new();
    for (index, segment) in document.segments.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}\n{} --> {}\n{}\n",
            index + 1,
            srt_timestamp(segment.start),
            srt_timestamp(segment.end),
            cue_text(segment)
        );
    }
    out
}

fn cue_text(segment: &FinalResultSegment) -> String {
    segment.spk_id.as_deref().map_or_else(
        || segment.segment.clone(),
        |spk| format!("{spk}: {}", segment.segment),
    )
}

fn vtt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (hours, minutes, secs, millis) = split_ms(total_ms);
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

fn srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (hours, minutes, secs, millis) = split_ms(total_ms);
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

const fn split_ms(total_ms: u64) -> (u64, u64, u64, u64) {
    let millis = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_minutes = total_secs / 60;
    let minutes = total_minutes % 60;
    let hours = total_minutes / 60;
    (hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_document() -> FinalResultDocument {
        FinalResultDocument {
            transcription_result: "A: hello\nB: world".to_string(),
            raw_transcription: "hello world".to_string(),
            confidence: 0.9,
            segments: vec![
                FinalResultSegment {
                    spk_id: Some("A".to_string()),
                    start: 0.0,
                    end: 1.5,
                    duration: 1.5,
                    raw_segment: "hello".to_string(),
                    segment: "Hello.".to_string(),
                    words: vec![],
                },
                FinalResultSegment {
                    spk_id: Some("B".to_string()),
                    start: 1.5,
                    end: 3.0,
                    duration: 1.5,
                    raw_segment: "world".to_string(),
                    segment: "World.".to_string(),
                    words: vec![],
                },
            ],
            diarization_segments: vec![],
        }
    }

    #[test]
    fn negotiates_known_media_types() {
        assert_eq!(ResultFormat::from_accept_header("application/json"), Some(ResultFormat::Json));
        assert_eq!(ResultFormat::from_accept_header("text/plain"), Some(ResultFormat::Text));
        assert_eq!(ResultFormat::from_accept_header("text/vtt"), Some(ResultFormat::Vtt));
        assert_eq!(ResultFormat::from_accept_header("text/srt"), Some(ResultFormat::Srt));
        assert_eq!(ResultFormat::from_accept_header("application/xml"), None);
    }

    #[test]
    fn text_format_renders_transcription_result() {
        let rendered = render(&sample_document(), ResultFormat::Text);
        assert_eq!(rendered, "A: hello\nB: world");
    }

    #[test]
    fn vtt_format_has_header_and_cues() {
        let rendered = render(&sample_document(), ResultFormat::Vtt);
        assert!(rendered.starts_with("WEBVTT\n\n"));
        assert!(rendered.contains("00:00:00.000 --> 00:00:01.500"));
        assert!(rendered.contains("A: Hello."));
    }

    #[test]
    fn srt_format_numbers_cues_from_one() {
        let rendered = render(&sample_document(), ResultFormat::Srt);
        assert!(rendered.starts_with("1\n00:00:00,000 --> 00:00:01,500\nA: Hello."));
        assert!(rendered.contains("2\n00:00:01,500 --> 00:00:03,000\nB: World."));
    }
}
