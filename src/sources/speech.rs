use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use uuid::Uuid;

use super::TranscriptSource;
use super::caption_api::{ACCEPT_LANGUAGE, USER_AGENT};
use super::player_tracks::PlayerClient;
use crate::errors::SourceError;
use crate::providers::openai::OpenAi;
use crate::segment::{Segment, split_sentences};
use crate::video_reference::VideoId;

/// Span of one synthesized pseudo-segment when the service returns only
/// flat text
const PSEUDO_SEGMENT_SECS: f64 = 5.0;

/// Tier 4: speech recognition on downloaded audio.
///
/// Last and most expensive resort. Downloads the smallest usable audio
/// rendition to a request-scoped temp file, submits it to the speech-to-text
/// service with segment timing requested, and maps the result to segments.
/// The temp scope is deleted on every exit path.
pub struct SpeechSource {
    player: Arc<PlayerClient>,
    openai: Arc<OpenAi>,
    audio_itags: Vec<u32>,
    min_audio_bytes: u64,
    speech_model: String,
}

impl SpeechSource {
    /// Create a speech source over shared player and provider clients
    pub fn new(
        player: Arc<PlayerClient>,
        openai: Arc<OpenAi>,
        audio_itags: Vec<u32>,
        min_audio_bytes: u64,
        speech_model: String,
    ) -> Self {
        Self {
            player,
            openai,
            audio_itags,
            min_audio_bytes,
            speech_model,
        }
    }

    /// Download best-available audio into the staging directory, enforcing
    /// the minimum size threshold
    async fn download_audio(
        &self,
        video: &VideoId,
        dir: &std::path::Path,
    ) -> Result<std::path::PathBuf, SourceError> {
        let response = self.player.player_response(video).await?;
        let url = response
            .audio_url(&self.audio_itags)
            .ok_or_else(|| SourceError::NoCaptions("no audio stream with a direct URL".to_string()))?;

        let http = reqwest::Client::new();
        let audio = http
            .get(&url)
            .header("user-agent", USER_AGENT)
            .header("accept-language", ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(|e| SourceError::Upstream {
                status: 0,
                message: format!("audio download failed: {e}"),
            })?;

        let status = audio.status();
        if !status.is_success() {
            return Err(SourceError::Upstream {
                status: status.as_u16(),
                message: format!("audio download answered {status}"),
            });
        }

        let bytes = audio.bytes().await.map_err(|e| SourceError::Upstream {
            status: status.as_u16(),
            message: format!("audio download interrupted: {e}"),
        })?;

        if (bytes.len() as u64) < self.min_audio_bytes {
            return Err(SourceError::AudioTooSmall {
                got: bytes.len() as u64,
                min: self.min_audio_bytes,
            });
        }

        let path = dir.join(format!("{}.m4a", video.as_str()));
        tokio::fs::write(&path, &bytes).await?;
        debug!("Downloaded {} bytes of audio for {}", bytes.len(), video);

        Ok(path)
    }
}

#[async_trait]
impl TranscriptSource for SpeechSource {
    fn name(&self) -> &'static str {
        "speech"
    }

    async fn fetch(&self, video: &VideoId) -> Result<Vec<Segment>, SourceError> {
        // Unique per-request prefix so concurrent requests never collide;
        // the guard removes everything when it drops, on success or error
        let staging = tempfile::Builder::new()
            .prefix(&format!("kikitori_{}_", Uuid::new_v4()))
            .tempdir()?;

        let audio_path = self.download_audio(video, staging.path()).await?;

        let transcription = self
            .openai
            .transcribe_file(&audio_path, &self.speech_model)
            .await?;

        if !transcription.segments.is_empty() {
            let segments: Vec<Segment> = transcription
                .segments
                .into_iter()
                .filter_map(|s| {
                    let text = s.text.trim();
                    if text.is_empty() {
                        return None;
                    }
                    let start = s.start.max(0.0);
                    let end = s.end.max(start + 0.01);
                    Some(Segment::new(start, end, text))
                })
                .collect();

            info!(
                "Speech recognition produced {} timed segments for {}",
                segments.len(),
                video
            );
            return Ok(segments);
        }

        // Degraded path: no timing information, synthesize fixed-width
        // pseudo-segments from sentence splits
        let sentences = split_sentences(&transcription.text);
        info!(
            "Speech recognition returned flat text for {}; synthesized {} pseudo-segments",
            video,
            sentences.len()
        );

        Ok(sentences
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let start = i as f64 * PSEUDO_SEGMENT_SECS;
                Segment::new(start, start + PSEUDO_SEGMENT_SECS, text)
            })
            .collect())
    }
}
