/*!
 * Transcript segment model and post-processing.
 *
 * A [`Segment`] is one spoken utterance with its on-screen timing. Parsers and
 * the speech fallback produce plain segments; enrichment adds romaji and a
 * translation, and [`assemble`] zips everything into the final response rows.
 */

use anyhow::{Result, anyhow};
use log::{debug, warn};
use serde::Serialize;

use crate::app_config::MergeOptions;
use crate::errors::TranscriptError;

/// Single time-aligned transcript segment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds, always greater than `start`
    pub end: f64,

    /// Transcribed text, never empty
    pub text: String,
}

impl Segment {
    /// Creates a new segment without validation - used by tests and parsers
    /// that have already established the invariants
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Segment {
            start,
            end,
            text: text.into(),
        }
    }

    /// Creates a validated segment: non-negative start, positive duration,
    /// non-empty text
    pub fn new_validated(start: f64, end: f64, text: String) -> Result<Self> {
        if start < 0.0 {
            return Err(anyhow!("Invalid start time {} (must be >= 0)", start));
        }
        if end <= start {
            return Err(anyhow!(
                "Invalid time range: end {} <= start {}",
                end,
                start
            ));
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Empty segment text at {}s", start));
        }

        Ok(Segment {
            start,
            end,
            text: trimmed.to_string(),
        })
    }

    /// Duration of the segment in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Fully-populated transcript row returned to the caller
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TranscriptLine {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Transcribed text
    pub text: String,

    /// Romaji transliteration, empty when not applicable or degraded
    pub romaji: String,

    /// Translation, empty when skipped or degraded
    pub vn: String,
}

/// Coalesce spurious micro-fragments left behind by auto-generated captions.
///
/// Single left-to-right pass: a candidate is merged into the previously
/// accepted segment when the gap between them is below `max_gap_secs` and
/// either text is shorter than `short_text_chars` characters. Only adjacent
/// pairs are considered once; this is not run to a fixed point.
pub fn merge_short_segments(segments: Vec<Segment>, options: &MergeOptions) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());

    for segment in segments {
        if let Some(last) = merged.last_mut() {
            let gap = segment.start - last.end;
            let short = segment.text.chars().count() < options.short_text_chars
                || last.text.chars().count() < options.short_text_chars;

            if gap < options.max_gap_secs && short {
                last.end = last.end.max(segment.end);
                last.text = format!("{} {}", last.text, segment.text).trim().to_string();
                continue;
            }
        }
        merged.push(segment);
    }

    merged
}

/// Zip segments with the two enrichment outputs into the final rows.
///
/// Pure structural combination. All three inputs must have the same length;
/// a mismatch is a programming error upstream and fails the whole request.
pub fn assemble(
    segments: Vec<Segment>,
    romaji: Vec<String>,
    translations: Vec<String>,
) -> Result<Vec<TranscriptLine>, TranscriptError> {
    if romaji.len() != segments.len() || translations.len() != segments.len() {
        return Err(TranscriptError::Internal(format!(
            "enrichment output length mismatch: {} segments, {} romaji, {} translations",
            segments.len(),
            romaji.len(),
            translations.len()
        )));
    }

    let lines = segments
        .into_iter()
        .zip(romaji)
        .zip(translations)
        .map(|((segment, romaji), vn)| TranscriptLine {
            start: segment.start,
            end: segment.end,
            text: segment.text,
            romaji,
            vn,
        })
        .collect();

    Ok(lines)
}

/// Split flat text on sentence-ending punctuation.
///
/// Used by the speech fallback when the service returns no per-segment
/// timing. Terminators stay attached to their sentence. Covers ASCII and
/// CJK sentence enders.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?' | '。' | '！' | '？') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    if sentences.is_empty() {
        debug!("No sentences found in flat transcription text");
    }

    sentences
}

/// Log a warning if the segment list is not strictly sorted by start time.
/// Parsers sort their output; this catches sources that hand us raw lists.
pub fn check_sorted(segments: &[Segment]) {
    let unsorted = segments
        .windows(2)
        .filter(|pair| pair[1].start < pair[0].start)
        .count();
    if unsorted > 0 {
        warn!("Segment list has {} out-of-order entries", unsorted);
    }
}
