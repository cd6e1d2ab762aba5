/*!
 * Canonical video identifier resolution.
 *
 * Users paste anything: a bare 11-character id, a short link, a watch URL,
 * an embed path. Everything downstream works with the canonical [`VideoId`],
 * so resolution happens exactly once at the request boundary. Malformed input
 * resolves to an error, never a panic.
 */

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::errors::TranscriptError;

// Canonical video id token: exactly 11 URL-safe base64 characters
static VIDEO_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// Canonical identifier of an externally hosted video
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Resolve a free-form reference into the canonical id.
    ///
    /// Accepted forms: a bare token, `youtu.be/<id>`,
    /// `youtube.com/watch?v=<id>`, and `/embed/<id>` or `/shorts/<id>`
    /// paths on any youtube host.
    pub fn parse(raw: &str) -> Result<Self, TranscriptError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TranscriptError::Input("Missing url".to_string()));
        }

        if VIDEO_ID_REGEX.is_match(trimmed) {
            return Ok(VideoId(trimmed.to_string()));
        }

        let url = Url::parse(trimmed)
            .map_err(|_| TranscriptError::Input(format!("Unrecognized video link: {trimmed}")))?;

        if let Some(candidate) = Self::extract_from_url(&url) {
            if VIDEO_ID_REGEX.is_match(&candidate) {
                return Ok(VideoId(candidate));
            }
        }

        Err(TranscriptError::Input(format!(
            "No video id found in url: {trimmed}"
        )))
    }

    fn extract_from_url(url: &Url) -> Option<String> {
        let host = url.host_str()?.to_ascii_lowercase();

        // youtu.be/<id>
        if host == "youtu.be" {
            let first = url.path_segments()?.next()?.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }

        // watch?v=<id>
        if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
            let v = v.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }

        // /embed/<id>, /shorts/<id>
        let mut segments = url.path_segments()?;
        let first = segments.next().unwrap_or("");
        let second = segments.next().unwrap_or("");
        if matches!(first, "embed" | "shorts") && !second.trim().is_empty() {
            return Some(second.to_string());
        }

        None
    }

    /// The canonical 11-character token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for upstream calls that want a full link
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
