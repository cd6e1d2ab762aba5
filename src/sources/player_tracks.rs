use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::TranscriptSource;
use super::caption_api::{ACCEPT_LANGUAGE, USER_AGENT};
use crate::app_config::MergeOptions;
use crate::errors::SourceError;
use crate::segment::Segment;
use crate::timed_text::{parse_srv3, parse_vtt};
use crate::video_reference::VideoId;

const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player";

// fmt query parameter inside a caption track base URL
static FMT_PARAM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"fmt=[^&]+").unwrap());

// The ANDROID client profile gets unthrottled stream URLs and a plain
// caption track list without signature ciphering
const CLIENT_NAME: &str = "ANDROID";
const CLIENT_VERSION: &str = "19.09.37";
const ANDROID_SDK_VERSION: u32 = 30;

/// Player API response, reduced to the fields the pipeline consumes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    captions: Option<Captions>,

    #[serde(default)]
    streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    #[serde(default)]
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

/// One caption track advertised by the player
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    /// Track URL without a format parameter
    pub base_url: String,

    /// BCP-47 language code
    #[serde(default)]
    pub language_code: String,

    /// "asr" marks an auto-generated track
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamingData {
    #[serde(default)]
    adaptive_formats: Vec<AdaptiveFormat>,
}

/// One adaptive stream variant
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveFormat {
    /// Stream format id
    #[serde(default)]
    pub itag: u32,

    /// Direct stream URL; absent for ciphered variants
    #[serde(default)]
    pub url: Option<String>,

    /// MIME type, e.g. `audio/mp4; codecs="mp4a.40.5"`
    #[serde(default)]
    pub mime_type: String,
}

impl PlayerResponse {
    /// Caption tracks, empty when the video has none
    pub fn caption_tracks(&self) -> &[CaptionTrack] {
        self.captions
            .as_ref()
            .and_then(|c| c.player_captions_tracklist_renderer.as_ref())
            .map(|r| r.caption_tracks.as_slice())
            .unwrap_or_default()
    }

    /// Best audio stream URL: preferred itags first, then any audio
    /// format with a direct URL
    pub fn audio_url(&self, preferred_itags: &[u32]) -> Option<String> {
        let formats = self
            .streaming_data
            .as_ref()
            .map(|s| s.adaptive_formats.as_slice())
            .unwrap_or_default();

        for itag in preferred_itags {
            if let Some(format) = formats
                .iter()
                .find(|f| f.itag == *itag && f.url.is_some())
            {
                return format.url.clone();
            }
        }

        formats
            .iter()
            .find(|f| f.mime_type.starts_with("audio/") && f.url.is_some())
            .and_then(|f| f.url.clone())
    }
}

/// Shared client for the innertube player endpoint.
///
/// Used by the raw-track tier for caption tracks and by the speech tier for
/// audio stream URLs.
#[derive(Debug)]
pub struct PlayerClient {
    client: Client,
}

impl PlayerClient {
    /// Create a player client with the given per-request timeout
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Fetch the player response for a video
    pub async fn player_response(&self, video: &VideoId) -> Result<PlayerResponse, SourceError> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                    "androidSdkVersion": ANDROID_SDK_VERSION,
                }
            },
            "videoId": video.as_str(),
        });

        let response = self
            .client
            .post(PLAYER_ENDPOINT)
            .header("user-agent", USER_AGENT)
            .header("accept-language", ACCEPT_LANGUAGE)
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::Upstream {
                status: 0,
                message: format!("player request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::Upstream {
                status: status.as_u16(),
                message: format!("player endpoint answered {status}: {text}"),
            });
        }

        response
            .json::<PlayerResponse>()
            .await
            .map_err(|e| SourceError::Parse(format!("player response: {e}")))
    }

    /// Fetch a caption track body with the given format parameter
    pub async fn fetch_track(&self, base_url: &str, fmt: &str) -> Result<String, SourceError> {
        let url = if base_url.contains("fmt=") {
            FMT_PARAM_REGEX
                .replace(base_url, format!("fmt={fmt}"))
                .into_owned()
        } else {
            format!("{base_url}&fmt={fmt}")
        };

        let response = self
            .client
            .get(&url)
            .header("user-agent", USER_AGENT)
            .header("accept-language", ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(|e| SourceError::Upstream {
                status: 0,
                message: format!("caption track request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Upstream {
                status: status.as_u16(),
                message: format!("caption track answered {status}"),
            });
        }

        response.text().await.map_err(|e| SourceError::Upstream {
            status: status.as_u16(),
            message: format!("failed to read caption track body: {e}"),
        })
    }
}

/// Tier 2: raw caption-track extraction through the player API.
///
/// Picks a track by language preference (auto-generated tracks as a last
/// resort), then tries the VTT rendition first and falls back to srv3. That
/// sub-format fallback is this tier's own contract.
pub struct PlayerTracksSource {
    player: Arc<PlayerClient>,
    languages: Vec<String>,
    merge: MergeOptions,
}

impl PlayerTracksSource {
    /// Create a source over a shared player client
    pub fn new(player: Arc<PlayerClient>, languages: Vec<String>, merge: MergeOptions) -> Self {
        Self {
            player,
            languages,
            merge,
        }
    }

    /// Select a caption track: preferred language, else the first track,
    /// else any auto-generated one
    fn select_track<'a>(&self, tracks: &'a [CaptionTrack]) -> Option<&'a CaptionTrack> {
        for language in &self.languages {
            if let Some(track) = tracks.iter().find(|t| &t.language_code == language) {
                return Some(track);
            }
        }
        tracks
            .first()
            .or_else(|| tracks.iter().find(|t| t.kind.as_deref() == Some("asr")))
    }
}

#[async_trait]
impl TranscriptSource for PlayerTracksSource {
    fn name(&self) -> &'static str {
        "player-tracks"
    }

    async fn fetch(&self, video: &VideoId) -> Result<Vec<Segment>, SourceError> {
        let response = self.player.player_response(video).await?;
        let tracks = response.caption_tracks();

        if tracks.is_empty() {
            return Err(SourceError::NoCaptions(
                "player response lists no caption tracks".to_string(),
            ));
        }

        let track = self
            .select_track(tracks)
            .ok_or_else(|| SourceError::NoCaptions("no usable caption track".to_string()))?;

        debug!(
            "Selected caption track lang={} kind={:?} for {}",
            track.language_code, track.kind, video
        );

        // VTT first; some tracks only publish srv3
        if let Ok(body) = self.player.fetch_track(&track.base_url, "vtt").await {
            if body.contains("WEBVTT") {
                return parse_vtt(&body, &self.merge)
                    .map_err(|e| SourceError::Parse(e.to_string()));
            }
        }

        let body = self.player.fetch_track(&track.base_url, "srv3").await?;
        parse_srv3(&body, &self.merge).map_err(|e| SourceError::Parse(e.to_string()))
    }
}
