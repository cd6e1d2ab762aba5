use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Transcript acquisition settings
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Enrichment (romaji + translation) settings
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Micro-fragment merge thresholds
    #[serde(default)]
    pub merge: MergeOptions,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether a bearer credential is required on /transcript
    #[serde(default)]
    pub require_auth: bool,

    /// Token verification endpoint of the identity provider.
    /// Empty disables verification; with require_auth set, requests then
    /// answer 500 until a verifier is configured.
    #[serde(default = "String::new")]
    pub token_info_endpoint: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            require_auth: false,
            token_info_endpoint: String::new(),
        }
    }
}

/// Transcript acquisition configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourcesConfig {
    /// Caption languages to try, in preference order
    #[serde(default = "default_preferred_languages")]
    pub preferred_languages: Vec<String>,

    /// Whether to register the yt-dlp assisted extraction tier
    #[serde(default)]
    pub enable_downloader: bool,

    /// Binary name or path for the external downloader
    #[serde(default = "default_downloader_bin")]
    pub downloader_bin: String,

    /// Seconds to wait for the external downloader before giving up
    #[serde(default = "default_downloader_timeout_secs")]
    pub downloader_timeout_secs: u64,

    /// Audio itags to prefer for the speech fallback, in order.
    /// 139 is 48kbps AAC, 140 is 128kbps.
    #[serde(default = "default_audio_itags")]
    pub audio_itags: Vec<u32>,

    /// Minimum audio download size in bytes; smaller downloads are
    /// treated as failures
    #[serde(default = "default_min_audio_bytes")]
    pub min_audio_bytes: u64,

    /// Timeout for individual upstream HTTP calls in seconds
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            preferred_languages: default_preferred_languages(),
            enable_downloader: false,
            downloader_bin: default_downloader_bin(),
            downloader_timeout_secs: default_downloader_timeout_secs(),
            audio_itags: default_audio_itags(),
            min_audio_bytes: default_min_audio_bytes(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

/// Enrichment service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EnrichmentConfig {
    /// Chat model used for romaji and translation
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Speech-to-text model for the audio fallback
    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    /// API key; falls back to the OPENAI_API_KEY environment variable
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL (optional, for compatible self-hosted servers)
    #[serde(default = "default_enrichment_endpoint")]
    pub endpoint: String,

    /// Maximum segments per romaji request
    #[serde(default = "default_romaji_batch_size")]
    pub romaji_batch_size: usize,

    /// Maximum segments per translation request
    #[serde(default = "default_translate_batch_size")]
    pub translate_batch_size: usize,

    /// Translation target language name, used verbatim in the prompt
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Request timeout in seconds. Speech transcription of long audio is
    /// slow, so this is generous.
    #[serde(default = "default_enrichment_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            speech_model: default_speech_model(),
            api_key: String::new(),
            endpoint: default_enrichment_endpoint(),
            romaji_batch_size: default_romaji_batch_size(),
            translate_batch_size: default_translate_batch_size(),
            target_language: default_target_language(),
            timeout_secs: default_enrichment_timeout_secs(),
        }
    }
}

impl EnrichmentConfig {
    /// Get the API key, falling back to the environment
    pub fn get_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var("OPENAI_API_KEY").unwrap_or_default()
    }
}

/// Merge thresholds for coalescing micro-fragments.
///
/// Configurable, but the defaults work well for auto-generated caption
/// tracks and there is no evidence other values do better.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct MergeOptions {
    /// Maximum gap in seconds between segments eligible for merging
    #[serde(default = "default_max_gap_secs")]
    pub max_gap_secs: f64,

    /// Texts shorter than this many characters count as "short"
    #[serde(default = "default_short_text_chars")]
    pub short_text_chars: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            max_gap_secs: default_max_gap_secs(),
            short_text_chars: default_short_text_chars(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_preferred_languages() -> Vec<String> {
    ["ja", "ja-JP", "en", "en-US", "vi", "zh-Hans", "zh-Hant", "ko"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_downloader_bin() -> String {
    "yt-dlp".to_string()
}

fn default_downloader_timeout_secs() -> u64 {
    120
}

fn default_audio_itags() -> Vec<u32> {
    vec![139, 140]
}

fn default_min_audio_bytes() -> u64 {
    10 * 1024
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_speech_model() -> String {
    "whisper-1".to_string()
}

fn default_enrichment_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_romaji_batch_size() -> usize {
    40
}

fn default_translate_batch_size() -> usize {
    30
}

fn default_target_language() -> String {
    "Vietnamese".to_string()
}

fn default_enrichment_timeout_secs() -> u64 {
    180
}

fn default_max_gap_secs() -> f64 {
    0.15
}

fn default_short_text_chars() -> usize {
    4
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Server port must be non-zero"));
        }

        if self.sources.preferred_languages.is_empty() {
            return Err(anyhow!("At least one preferred caption language is required"));
        }

        if self.enrichment.romaji_batch_size == 0 || self.enrichment.translate_batch_size == 0 {
            return Err(anyhow!("Enrichment batch sizes must be greater than zero"));
        }

        if self.merge.max_gap_secs < 0.0 {
            return Err(anyhow!("Merge gap threshold must be non-negative"));
        }

        if self.server.require_auth && self.server.token_info_endpoint.is_empty() {
            // Not fatal: the server still starts and answers 500 per
            // request until a verifier is configured
            log::warn!(
                "require_auth is set but no token_info_endpoint is configured - \
                 /transcript will answer 500 until one is provided"
            );
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            sources: SourcesConfig::default(),
            enrichment: EnrichmentConfig::default(),
            merge: MergeOptions::default(),
            log_level: LogLevel::default(),
        }
    }
}
