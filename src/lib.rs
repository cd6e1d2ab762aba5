/*!
 * # Kikitori - transcript service for language learners
 *
 * A Rust library and HTTP service that turns a video reference into a
 * time-aligned, enriched transcript for listening practice.
 *
 * ## Features
 *
 * - Multi-tier transcript acquisition with graceful fallback:
 *   - Hosted caption lookup (timedtext endpoint)
 *   - Raw caption-track extraction through the player API
 *   - Optional external downloader (yt-dlp)
 *   - Speech recognition on downloaded audio
 * - Micro-fragment merging for auto-generated captions
 * - Batched romaji transliteration and translation with per-batch
 *   degradation (a bad batch never fails the request)
 * - Playback synchronizer keeping a transcript view aligned with a player
 * - Optional bearer-credential enforcement on the HTTP API
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `video_reference`: Video URL and id parsing
 * - `segment`: Segment model, merging, assembly
 * - `timed_text`: WebVTT and srv3 caption parsers
 * - `sources`: Acquisition strategies and the fallback chain:
 *   - `sources::caption_api`: Hosted caption lookup
 *   - `sources::player_tracks`: Player API caption tracks
 *   - `sources::downloader`: External downloader tier
 *   - `sources::speech`: Speech-recognition fallback
 * - `providers`: Clients for external language services
 * - `enrichment`: Batched romaji and translation passes
 * - `playback_sync`: Player/transcript synchronizer
 * - `server`: HTTP API (axum)
 * - `app_controller`: End-to-end pipeline wiring
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod enrichment;
pub mod errors;
pub mod playback_sync;
pub mod providers;
pub mod segment;
pub mod server;
pub mod sources;
pub mod timed_text;
pub mod video_reference;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::TranscriptPipeline;
pub use errors::{ProviderError, SourceError, TranscriptError};
pub use segment::{Segment, TranscriptLine};
pub use video_reference::VideoId;
