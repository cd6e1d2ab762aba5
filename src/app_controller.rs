/*!
 * Top-level transcript pipeline: acquisition, enrichment, assembly.
 *
 * Wires the source chain and the enricher from configuration and runs one
 * request end to end. The chain and enricher are injectable so tests can
 * substitute scripted sources and providers.
 */

use std::sync::Arc;

use log::{debug, info};

use crate::app_config::Config;
use crate::enrichment::Enricher;
use crate::errors::TranscriptError;
use crate::providers::openai::OpenAi;
use crate::segment::{TranscriptLine, assemble, check_sorted};
use crate::sources::caption_api::CaptionApiSource;
use crate::sources::downloader::DownloaderSource;
use crate::sources::player_tracks::{PlayerClient, PlayerTracksSource};
use crate::sources::speech::SpeechSource;
use crate::sources::{SourceChain, TranscriptSource};
use crate::video_reference::VideoId;

/// The acquisition and enrichment pipeline behind the HTTP API
pub struct TranscriptPipeline {
    chain: SourceChain,
    enricher: Enricher,
}

impl TranscriptPipeline {
    /// Assemble a pipeline from explicit parts
    pub fn new(chain: SourceChain, enricher: Enricher) -> Self {
        Self { chain, enricher }
    }

    /// Build the production pipeline from configuration.
    ///
    /// Registration order is fixed: hosted caption lookup, raw player
    /// tracks, optionally the external downloader, then speech recognition.
    pub fn from_config(config: &Config) -> Self {
        let merge = config.merge;
        let languages = config.sources.preferred_languages.clone();
        let player = Arc::new(PlayerClient::new(config.sources.upstream_timeout_secs));
        let openai = Arc::new(OpenAi::new(
            &config.enrichment.get_api_key(),
            &config.enrichment.endpoint,
            &config.enrichment.model,
            config.enrichment.timeout_secs,
        ));

        let mut sources: Vec<Box<dyn TranscriptSource>> = vec![
            Box::new(CaptionApiSource::new(
                languages.clone(),
                merge,
                config.sources.upstream_timeout_secs,
            )),
            Box::new(PlayerTracksSource::new(
                Arc::clone(&player),
                languages.clone(),
                merge,
            )),
        ];

        if config.sources.enable_downloader {
            debug!(
                "Registering downloader tier ({})",
                config.sources.downloader_bin
            );
            sources.push(Box::new(DownloaderSource::new(
                config.sources.downloader_bin.clone(),
                languages,
                merge,
                config.sources.downloader_timeout_secs,
            )));
        }

        sources.push(Box::new(SpeechSource::new(
            player,
            Arc::clone(&openai),
            config.sources.audio_itags.clone(),
            config.sources.min_audio_bytes,
            config.enrichment.speech_model.clone(),
        )));

        info!("Transcript pipeline ready with {} sources", sources.len());

        Self {
            chain: SourceChain::new(sources),
            enricher: Enricher::new(openai, &config.enrichment),
        }
    }

    /// Run one request: acquire segments, enrich, assemble rows
    pub async fn run(
        &self,
        video: &VideoId,
        skip_translate: bool,
    ) -> Result<Vec<TranscriptLine>, TranscriptError> {
        let segments = self.chain.acquire(video).await?;
        check_sorted(&segments);

        let romaji = self.enricher.romaji_pass(&segments).await;
        let translations = self.enricher.translate_pass(&segments, skip_translate).await;

        assemble(segments, romaji, translations)
    }
}
