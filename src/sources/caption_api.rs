use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::TranscriptSource;
use crate::app_config::MergeOptions;
use crate::errors::SourceError;
use crate::segment::Segment;
use crate::timed_text::parse_srv3;
use crate::video_reference::VideoId;

/// Browser-like headers; the caption endpoints answer differently to
/// obvious bot user agents
pub(crate) const USER_AGENT: &str = "Mozilla/5.0";
pub(crate) const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.8";

/// Tier 1: hosted caption lookup via the public timedtext endpoint.
///
/// Cheapest strategy - one GET per preferred language, srv3 JSON back.
/// Only finds captions that are published for anonymous access.
pub struct CaptionApiSource {
    client: Client,
    languages: Vec<String>,
    merge: MergeOptions,
}

impl CaptionApiSource {
    /// Create a source trying the given languages in order
    pub fn new(languages: Vec<String>, merge: MergeOptions, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            languages,
            merge,
        }
    }

    async fn fetch_language(
        &self,
        video: &VideoId,
        language: &str,
    ) -> Result<Vec<Segment>, SourceError> {
        let url = format!(
            "https://www.youtube.com/api/timedtext?v={}&lang={}&fmt=json3",
            video.as_str(),
            language
        );

        let response = self
            .client
            .get(&url)
            .header("user-agent", USER_AGENT)
            .header("accept-language", ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(|e| SourceError::Upstream {
                status: 0,
                message: format!("timedtext request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Upstream {
                status: status.as_u16(),
                message: format!("timedtext answered {status} for lang {language}"),
            });
        }

        let body = response.text().await.map_err(|e| SourceError::Upstream {
            status: status.as_u16(),
            message: format!("failed to read timedtext body: {e}"),
        })?;

        // The endpoint answers 200 with an empty body when the language
        // has no track
        if body.trim().is_empty() {
            return Err(SourceError::NoCaptions(format!(
                "no {language} track published"
            )));
        }

        parse_srv3(&body, &self.merge).map_err(|e| SourceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TranscriptSource for CaptionApiSource {
    fn name(&self) -> &'static str {
        "caption-api"
    }

    async fn fetch(&self, video: &VideoId) -> Result<Vec<Segment>, SourceError> {
        let mut last_error = SourceError::NoCaptions("no languages configured".to_string());

        for language in &self.languages {
            match self.fetch_language(video, language).await {
                Ok(segments) if !segments.is_empty() => {
                    debug!("timedtext hit for {} lang {}", video, language);
                    return Ok(segments);
                }
                Ok(_) => {
                    last_error = SourceError::NoCaptions(format!("empty {language} track"));
                }
                Err(e) => {
                    debug!("timedtext miss for {} lang {}: {}", video, language, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
