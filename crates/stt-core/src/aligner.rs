//! Diarization-to-words alignment: fuses a flat, time-ordered word sequence
//! with speaker-turn segments into a coherent sequence of [`SpeechSegment`]s.
//!
//! A pure function: no I/O, fully deterministic, unit-testable in isolation
//! from the rest of the orchestrator.

use crate::types::{DiarizationSegment, SpeechSegment, Word};

/// Tolerance, in seconds, for deciding whether a word straddling a segment
/// boundary belongs to the outgoing or incoming speaker.
const EPSILON: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Belongs,
    Advance,
}

/// Normalize a raw diarization segment list against the word sequence it will
/// be aligned with: sort, drop fully-enclosed segments, clamp the first
/// segment to start at zero, extend the last segment to cover the last word,
/// and close any remaining gaps/overlaps between adjacent segments at their
/// midpoint.
#[must_use]
pub fn normalize_diarization_segments(
    segments: &[DiarizationSegment],
    words: &[Word],
) -> Vec<DiarizationSegment> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<DiarizationSegment> = segments.to_vec();
    sorted.sort_by(|a, b| a.seg_begin.partial_cmp(&b.seg_begin).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<DiarizationSegment> = Vec::with_capacity(sorted.len());
    for seg in sorted {
        match kept.last() {
            Some(last) if seg.seg_end <= last.seg_end => {
                // Fully enclosed in the predecessor; drop it.
            }
            _ => kept.push(seg),
        }
    }

    if kept.is_empty() {
        return kept;
    }

    if let Some(first) = kept.first_mut() {
        first.seg_begin = 0.0;
    }

    let last_word_end = words.last().map_or(0.0, |w| w.end);
    if let Some(last) = kept.last_mut() {
        last.seg_end = last.seg_end.max(last_word_end);
    }

    for i in 0..kept.len().saturating_sub(1) {
        let mid = (kept[i].seg_end + kept[i + 1].seg_begin) / 2.0;
        kept[i].seg_end = mid;
        kept[i + 1].seg_begin = mid;
    }

    kept
}

/// Decide whether a straddling word belongs to the current segment or
/// advances into the next one.
///
/// Evaluated after the clear-cut end/start tests have both failed to resolve
/// the word. The punctuation signal (previous/current word ending a
/// sentence) is checked ahead of the symmetric timing-gap comparison: it is
/// the stronger signal and must win even when the timing gaps are tied.
fn decide_straddle(
    idx: usize,
    words: &[Word],
    current: &DiarizationSegment,
    next_segment: Option<&DiarizationSegment>,
) -> Outcome {
    if idx == 0 {
        return Outcome::Belongs;
    }
    if idx + 1 == words.len() {
        return Outcome::Advance;
    }

    let w = &words[idx];
    let prev = &words[idx - 1];
    let next = &words[idx + 1];

    if prev.ends_with_terminal_punctuation() {
        return Outcome::Advance;
    }
    if w.ends_with_terminal_punctuation() {
        return Outcome::Belongs;
    }

    let gap_prev = w.start - prev.end;
    let gap_next = next.start - w.end;
    if gap_prev.max(gap_next) >= EPSILON {
        return if gap_prev <= gap_next {
            Outcome::Belongs
        } else {
            Outcome::Advance
        };
    }

    if let Some(next_segment) = next_segment {
        let overlap_prev = current.seg_end - w.start;
        let overlap_next = w.end - next_segment.seg_begin;
        return if overlap_prev >= overlap_next {
            Outcome::Belongs
        } else {
            Outcome::Advance
        };
    }

    Outcome::Belongs
}

fn decide(
    idx: usize,
    words: &[Word],
    current: &DiarizationSegment,
    next_segment: Option<&DiarizationSegment>,
) -> Outcome {
    let w = &words[idx];
    if w.end <= current.seg_end - EPSILON {
        return Outcome::Belongs;
    }
    if w.start >= current.seg_end + EPSILON {
        return Outcome::Advance;
    }
    decide_straddle(idx, words, current, next_segment)
}

fn flush(committed: &mut Vec<SpeechSegment>, speaker: Option<String>, pending: &mut Vec<Word>) {
    if pending.is_empty() {
        return;
    }
    if let Some(last) = committed.last_mut() {
        if last.speaker_id == speaker {
            last.words.append(pending);
            return;
        }
    }
    committed.push(SpeechSegment::new(speaker, std::mem::take(pending)));
}

/// Merge a time-ordered word sequence with diarization segments into speech
/// segments, attributing each word to exactly one segment.
///
/// `words` must already be sorted by `start` (the orchestrator's fan-out
/// merge guarantees this). `diarization_segments` need not be normalized;
/// normalization is applied internally.
#[must_use]
pub fn align(words: &[Word], diarization_segments: &[DiarizationSegment]) -> Vec<SpeechSegment> {
    if words.is_empty() {
        return Vec::new();
    }

    let segments = normalize_diarization_segments(diarization_segments, words);
    if segments.is_empty() {
        return vec![SpeechSegment::new(None, words.to_vec())];
    }

    let mut committed: Vec<SpeechSegment> = Vec::new();
    let mut segment_index = 0usize;
    let mut current_speaker = Some(segments[0].spk_id.clone());
    let mut pending: Vec<Word> = Vec::new();

    for (idx, word) in words.iter().enumerate() {
        loop {
            let is_last_segment = segment_index + 1 == segments.len();
            let outcome = if is_last_segment {
                Outcome::Belongs
            } else {
                decide(
                    idx,
                    words,
                    &segments[segment_index],
                    segments.get(segment_index + 1),
                )
            };

            match outcome {
                Outcome::Belongs => {
                    pending.push(word.clone());
                    break;
                }
                Outcome::Advance => {
                    flush(&mut committed, current_speaker.take(), &mut pending);
                    segment_index += 1;
                    current_speaker = Some(segments[segment_index].spk_id.clone());
                }
            }
        }
    }
    flush(&mut committed, current_speaker, &mut pending);

    committed.sort_by(|a, b| a.start().partial_cmp(&b.start()).unwrap_or(std::cmp::Ordering::Equal));
    committed
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn w(text: &str, start: f64, end: f64) -> Word {
        Word::new(text, start, end, 1.0)
    }

    fn seg(spk: &str, begin: f64, end: f64, id: i64) -> DiarizationSegment {
        DiarizationSegment::new(begin, end, spk.to_string(), id)
    }

    #[test]
    fn empty_diarization_yields_single_unattributed_segment() {
        let words = vec![w("hi", 0.0, 1.0), w("there", 1.0, 2.0)];
        let segments = align(&words, &[]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].speaker_id, None);
        assert_eq!(segments[0].words.len(), 2);
    }

    #[test]
    fn s3_word_to_segment_straddle_ties_to_shorter_gap() {
        let words = vec![w("w1", 0.0, 1.0), w("w2", 1.8, 2.2), w("w3", 3.0, 4.0)];
        let diar = vec![seg("A", 0.0, 2.0, 0), seg("B", 2.0, 4.0, 1)];

        let segments = align(&words, &diar);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker_id.as_deref(), Some("A"));
        assert_eq!(segments[0].words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>(), vec!["w1", "w2"]);
        assert_eq!(segments[1].speaker_id.as_deref(), Some("B"));
        assert_eq!(segments[1].words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>(), vec!["w3"]);
    }

    #[test]
    fn s4_punctuation_tie_break_flips_s3_outcome() {
        let words = vec![w("hello.", 0.0, 1.0), w("w2", 1.8, 2.2), w("w3", 3.0, 4.0)];
        let diar = vec![seg("A", 0.0, 2.0, 0), seg("B", 2.0, 4.0, 1)];

        let segments = align(&words, &diar);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker_id.as_deref(), Some("A"));
        assert_eq!(segments[0].words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>(), vec!["hello."]);
        assert_eq!(segments[1].speaker_id.as_deref(), Some("B"));
        assert_eq!(segments[1].words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>(), vec!["w2", "w3"]);
    }

    #[test]
    fn s5_speaker_coalesces_across_spurious_boundary() {
        let words = vec![w("a1", 0.0, 1.0), w("a2", 4.0, 5.0)];
        let diar = vec![seg("A", 0.0, 2.0, 0), seg("B", 2.0, 2.1, 1), seg("A", 2.1, 5.0, 2)];

        let segments = align(&words, &diar);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].speaker_id.as_deref(), Some("A"));
        assert_eq!(segments[0].words.len(), 2);
    }

    #[test]
    fn normalization_sets_first_begin_to_zero_and_extends_last_end() {
        let words = vec![w("a", 0.5, 1.0), w("b", 4.0, 6.5)];
        let diar = vec![seg("A", 0.5, 2.0, 0), seg("B", 2.0, 6.0, 1)];

        let normalized = normalize_diarization_segments(&diar, &words);

        assert_eq!(normalized[0].seg_begin, 0.0);
        assert_eq!(normalized.last().unwrap().seg_end, 6.5);
    }

    #[test]
    fn normalization_drops_fully_enclosed_segments() {
        let words = vec![w("a", 0.0, 1.0)];
        let diar = vec![
            seg("A", 0.0, 5.0, 0),
            seg("B", 1.0, 3.0, 1), // enclosed: ends before A's end
            seg("C", 5.0, 7.0, 2),
        ];

        let normalized = normalize_diarization_segments(&diar, &words);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].spk_id, "A");
        assert_eq!(normalized[1].spk_id, "C");
    }

    #[test]
    fn normalization_closes_gaps_and_overlaps_at_midpoint() {
        let words = vec![w("a", 0.0, 1.0), w("b", 3.0, 4.0)];
        let diar = vec![seg("A", 0.0, 1.5, 0), seg("B", 2.5, 4.0, 1)];

        let normalized = normalize_diarization_segments(&diar, &words);

        assert_eq!(normalized[0].seg_end, 2.0);
        assert_eq!(normalized[1].seg_begin, 2.0);
    }

    #[test]
    fn property_word_count_is_conserved() {
        let words = vec![w("a", 0.0, 1.0), w("b", 1.0, 2.0), w("c", 2.0, 3.0)];
        let diar = vec![seg("A", 0.0, 1.5, 0), seg("B", 1.5, 3.0, 1)];

        let segments = align(&words, &diar);
        let total: usize = segments.iter().map(|s| s.words.len()).sum();
        assert_eq!(total, words.len());
    }

    #[test]
    fn property_every_segment_bounds_are_within_its_words() {
        let words = vec![w("a", 0.0, 1.0), w("b", 1.0, 2.0), w("c", 2.0, 3.0)];
        let diar = vec![seg("A", 0.0, 1.5, 0), seg("B", 1.5, 3.0, 1)];

        let segments = align(&words, &diar);
        for s in &segments {
            assert!(s.start() >= s.words.first().unwrap().start);
            assert!(s.end() <= s.words.last().unwrap().end);
        }
    }

    #[test]
    fn property_segments_are_sorted_by_start() {
        let words = vec![w("a", 0.0, 1.0), w("b", 1.0, 2.0), w("c", 2.0, 3.0), w("d", 3.0, 4.0)];
        let diar = vec![
            seg("A", 0.0, 1.0, 0),
            seg("B", 1.0, 2.0, 1),
            seg("C", 2.0, 3.0, 2),
            seg("D", 3.0, 4.0, 3),
        ];

        let segments = align(&words, &diar);
        let starts: Vec<f64> = segments.iter().map(SpeechSegment::start).collect();
        let mut sorted = starts.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(starts, sorted);
    }
}
