use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;
use uuid::Uuid;

use super::TranscriptSource;
use crate::app_config::MergeOptions;
use crate::errors::SourceError;
use crate::segment::Segment;
use crate::timed_text::parse_vtt;
use crate::video_reference::VideoId;

/// Tier 3 (optional): downloader-assisted caption extraction.
///
/// Shells out to yt-dlp to write caption files under a request-scoped temp
/// directory, then parses the best language match. Registered only when
/// enabled in configuration; on hosts without the binary the tier is simply
/// absent from the chain.
pub struct DownloaderSource {
    bin: String,
    languages: Vec<String>,
    merge: MergeOptions,
    timeout_secs: u64,
}

impl DownloaderSource {
    /// Create a source invoking the given binary
    pub fn new(
        bin: String,
        languages: Vec<String>,
        merge: MergeOptions,
        timeout_secs: u64,
    ) -> Self {
        Self {
            bin,
            languages,
            merge,
            timeout_secs,
        }
    }

    /// Pick the caption file best matching the language preference,
    /// falling back to the first one
    fn pick_caption_file(&self, files: &[PathBuf]) -> Option<PathBuf> {
        for language in &self.languages {
            let marker = format!(".{}.", language.to_lowercase());
            if let Some(hit) = files.iter().find(|f| {
                f.file_name()
                    .map(|n| n.to_string_lossy().to_lowercase().contains(&marker))
                    .unwrap_or(false)
            }) {
                return Some(hit.clone());
            }
        }
        files.first().cloned()
    }
}

#[async_trait]
impl TranscriptSource for DownloaderSource {
    fn name(&self) -> &'static str {
        "downloader"
    }

    async fn fetch(&self, video: &VideoId) -> Result<Vec<Segment>, SourceError> {
        // Request-scoped staging area, removed on every exit path when the
        // guard drops
        let staging = tempfile::Builder::new()
            .prefix(&format!("kikitori_{}_", Uuid::new_v4()))
            .tempdir()?;
        let out_template = staging
            .path()
            .join(format!("{}.%(ext)s", video.as_str()))
            .to_string_lossy()
            .into_owned();

        let sub_langs = self.languages.join(",");
        let watch_url = video.watch_url();
        let command_future = Command::new(&self.bin)
            .args([
                "--skip-download",
                "--write-sub",
                "--write-auto-sub",
                "--sub-lang",
                sub_langs.as_str(),
                "--sub-format",
                "vtt",
                "-o",
                out_template.as_str(),
                watch_url.as_str(),
            ])
            .output();

        let timeout = Duration::from_secs(self.timeout_secs);
        let output = tokio::select! {
            result = command_future => {
                result.map_err(|e| SourceError::Tool(format!("failed to run {}: {e}", self.bin)))?
            },
            _ = tokio::time::sleep(timeout) => {
                return Err(SourceError::Tool(format!(
                    "{} timed out after {}s", self.bin, self.timeout_secs
                )));
            }
        };

        if !output.status.success() {
            // Non-zero exit still sometimes leaves usable caption files
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "{} exited non-zero for {}: {}",
                self.bin,
                video,
                stderr.lines().last().unwrap_or("")
            );
        }

        let mut caption_files: Vec<PathBuf> = std::fs::read_dir(staging.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|e| e == "vtt").unwrap_or(false))
            .collect();
        caption_files.sort();

        let picked = self
            .pick_caption_file(&caption_files)
            .ok_or_else(|| SourceError::NoCaptions("downloader wrote no caption files".to_string()))?;

        debug!(
            "Parsing downloader caption file {:?} for {}",
            picked.file_name().unwrap_or_default(),
            video
        );

        let content = std::fs::read_to_string(&picked)?;
        parse_vtt(&content, &self.merge).map_err(|e| SourceError::Parse(e.to_string()))
    }
}
