/*!
 * Parsers for the two upstream timed-text formats.
 *
 * Caption tracks arrive either as cue-based subtitle text (WebVTT-style
 * `start --> end` blocks) or as the structured srv3 event JSON used by the
 * hosted caption endpoints. Both parsers normalize into the same sorted
 * [`Segment`] list and run the micro-fragment merger before returning.
 */

use anyhow::{Result, anyhow};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::app_config::MergeOptions;
use crate::segment::{Segment, merge_short_segments};

// Cue timestamp line; hours optional, fractional seconds required
static CUE_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(\d{1,2}):)?(\d{2}):(\d{2}\.\d{3})\s*-->\s*(?:(\d{1,2}):)?(\d{2}):(\d{2}\.\d{3})",
    )
    .unwrap()
});

// Comma-decimal timestamps (SRT style) that must become dot-decimal
// before cue matching
static COMMA_DECIMAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}:\d{2}:\d{2}|(?:\d{1,2}:)?\d{2}:\d{2}),(\d{3})").unwrap()
});

// Inline markup tags inside cue text
static MARKUP_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[^>]+>").unwrap());

/// Minimum span for cues that arrive with zero or negative duration
const MIN_CUE_SPAN_SECS: f64 = 0.2;

/// Minimum srv3 event duration once converted to seconds
const MIN_EVENT_DURATION_SECS: f64 = 0.01;

/// Default srv3 event duration when the field is absent
const DEFAULT_EVENT_DURATION_MS: f64 = 2000.0;

/// Parse cue-based subtitle text into merged segments.
///
/// Comma decimals are normalized first so SRT-flavored tracks match the same
/// timestamp grammar. Cues with zero or negative duration are widened to a
/// 0.2 second span instead of being dropped.
pub fn parse_vtt(content: &str, merge: &MergeOptions) -> Result<Vec<Segment>> {
    let normalized = content.replace('\r', "");
    let normalized = COMMA_DECIMAL_REGEX.replace_all(&normalized, "${1}.${2}");

    let mut segments: Vec<Segment> = Vec::new();
    let mut current: Option<(f64, f64, String)> = None;

    let mut flush = |cue: Option<(f64, f64, String)>, out: &mut Vec<Segment>| {
        if let Some((start, end, text)) = cue {
            let text = text.trim().to_string();
            if !text.is_empty() {
                let end = if end <= start { start + MIN_CUE_SPAN_SECS } else { end };
                out.push(Segment::new(start, end, text));
            }
        }
    };

    for line in normalized.lines() {
        if let Some(caps) = CUE_TIME_REGEX.captures(line) {
            flush(current.take(), &mut segments);
            let start = clock_to_secs(&caps, 1);
            let end = clock_to_secs(&caps, 4);
            current = Some((start, end, String::new()));
            continue;
        }

        if line.trim().is_empty() {
            flush(current.take(), &mut segments);
            continue;
        }

        if let Some((_, _, text)) = current.as_mut() {
            let clean = MARKUP_TAG_REGEX.replace_all(line, "");
            let clean = clean.trim();
            if !clean.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(clean);
            }
        }
    }
    flush(current.take(), &mut segments);

    if segments.is_empty() {
        return Err(anyhow!("No cues found in timed text"));
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    debug!("Parsed {} cues from cue-based track", segments.len());

    Ok(merge_short_segments(segments, merge))
}

/// Convert captured (hours?, minutes, seconds.millis) groups to seconds
fn clock_to_secs(caps: &regex::Captures, start_idx: usize) -> f64 {
    let hours: f64 = caps
        .get(start_idx)
        .map_or(0.0, |m| m.as_str().parse().unwrap_or(0.0));
    let minutes: f64 = caps
        .get(start_idx + 1)
        .map_or(0.0, |m| m.as_str().parse().unwrap_or(0.0));
    let seconds: f64 = caps
        .get(start_idx + 2)
        .map_or(0.0, |m| m.as_str().parse().unwrap_or(0.0));
    hours * 3600.0 + minutes * 60.0 + seconds
}

/// srv3 timed-text document
#[derive(Debug, Deserialize)]
struct Srv3Track {
    #[serde(default)]
    events: Vec<Srv3Event>,
}

/// One srv3 event: start offset, optional duration, text fragments
#[derive(Debug, Deserialize)]
struct Srv3Event {
    #[serde(rename = "tStartMs", default)]
    t_start_ms: Option<f64>,

    #[serde(rename = "dDurationMs", default)]
    d_duration_ms: Option<f64>,

    #[serde(default)]
    segs: Vec<Srv3Fragment>,
}

/// One text fragment inside an event
#[derive(Debug, Deserialize)]
struct Srv3Fragment {
    #[serde(default)]
    utf8: String,
}

/// Parse a structured srv3 event document into merged segments.
///
/// Events with no resulting text are dropped. A missing duration defaults to
/// 2000 ms; every event keeps at least a 0.01 second span.
pub fn parse_srv3(content: &str, merge: &MergeOptions) -> Result<Vec<Segment>> {
    let track: Srv3Track =
        serde_json::from_str(content).map_err(|e| anyhow!("Invalid srv3 JSON: {e}"))?;

    if track.events.is_empty() {
        return Err(anyhow!("srv3 document has no events"));
    }

    let mut segments: Vec<Segment> = track
        .events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs
                .iter()
                .map(|frag| frag.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }

            let start = (event.t_start_ms.unwrap_or(0.0) / 1000.0).max(0.0);
            let duration = event.d_duration_ms.unwrap_or(DEFAULT_EVENT_DURATION_MS) / 1000.0;
            let end = (start + duration).max(start + MIN_EVENT_DURATION_SECS);

            Some(Segment::new(start, end, text))
        })
        .collect();

    if segments.is_empty() {
        return Err(anyhow!("srv3 document has no text-bearing events"));
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    debug!("Parsed {} events from srv3 track", segments.len());

    Ok(merge_short_segments(segments, merge))
}
