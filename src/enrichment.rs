/*!
 * Batched segment enrichment: romaji transliteration and translation.
 *
 * Two independent passes over the merged segment list, each partitioning the
 * texts into size-bounded contiguous batches and asking the language service
 * for a JSON array of strings back. Enrichment never fails a request: a bad
 * batch degrades to empty strings, an unreachable service degrades the whole
 * pass.
 */

use std::fmt::Write as _;
use std::sync::Arc;

use log::warn;

use crate::app_config::EnrichmentConfig;
use crate::errors::ProviderError;
use crate::providers::{ChatProvider, ChatRequest};
use crate::segment::Segment;

/// Partition texts into contiguous batches of at most `bound` items,
/// preserving order
pub fn chunk_texts(texts: &[String], bound: usize) -> Vec<&[String]> {
    if bound == 0 {
        return vec![texts];
    }
    texts.chunks(bound).collect()
}

/// Parse a model response expected to be a JSON array of strings with
/// exactly `expected` elements. Tolerates a code fence or prose around the
/// array. Returns None on any mismatch.
pub fn parse_string_array(response: &str, expected: usize) -> Option<Vec<String>> {
    let trimmed = response.trim();

    let open = trimmed.find('[')?;
    let close = trimmed.rfind(']')?;
    if close <= open {
        return None;
    }

    let values: Vec<serde_json::Value> = serde_json::from_str(&trimmed[open..=close]).ok()?;
    if values.len() != expected {
        return None;
    }

    Some(
        values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect(),
    )
}

/// Enrichment service over a chat-completion provider
pub struct Enricher {
    provider: Arc<dyn ChatProvider>,
    romaji_batch_size: usize,
    translate_batch_size: usize,
    target_language: String,
}

impl Enricher {
    /// Create an enricher from configuration
    pub fn new(provider: Arc<dyn ChatProvider>, config: &EnrichmentConfig) -> Self {
        Self {
            provider,
            romaji_batch_size: config.romaji_batch_size,
            translate_batch_size: config.translate_batch_size,
            target_language: config.target_language.clone(),
        }
    }

    /// Transliteration pass. Always returns exactly one string per segment;
    /// degraded outputs are empty.
    pub async fn romaji_pass(&self, segments: &[Segment]) -> Vec<String> {
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();

        match self
            .run_pass(&texts, self.romaji_batch_size, |batch| {
                self.romaji_request(batch)
            })
            .await
        {
            Ok(outputs) => outputs,
            Err(e) => {
                warn!("Romaji pass degraded, service unusable: {}", e);
                vec![String::new(); texts.len()]
            }
        }
    }

    /// Translation pass. When `skip` is set every output is empty; when the
    /// service is unreachable outputs echo the original text.
    pub async fn translate_pass(&self, segments: &[Segment], skip: bool) -> Vec<String> {
        if skip {
            return vec![String::new(); segments.len()];
        }

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();

        match self
            .run_pass(&texts, self.translate_batch_size, |batch| {
                self.translate_request(batch)
            })
            .await
        {
            Ok(outputs) => outputs,
            Err(e) => {
                warn!("Translation pass degraded to source text, service unusable: {}", e);
                texts
            }
        }
    }

    /// Run one pass batch-by-batch, sequentially.
    ///
    /// A batch whose response cannot be parsed (or answers with a
    /// recoverable API error) yields empty strings; an unreachable service
    /// aborts the whole pass so the caller can apply its degradation
    /// policy.
    async fn run_pass(
        &self,
        texts: &[String],
        bound: usize,
        build_request: impl Fn(&[String]) -> ChatRequest,
    ) -> Result<Vec<String>, ProviderError> {
        let mut outputs: Vec<String> = Vec::with_capacity(texts.len());

        for batch in chunk_texts(texts, bound) {
            if batch.is_empty() {
                continue;
            }

            match self.provider.complete(build_request(batch)).await {
                Ok(response) => match parse_string_array(&response, batch.len()) {
                    Some(strings) => outputs.extend(strings),
                    None => {
                        warn!(
                            "Enrichment batch of {} answered with an unusable payload, \
                             emitting empty strings",
                            batch.len()
                        );
                        outputs.extend(std::iter::repeat_with(String::new).take(batch.len()));
                    }
                },
                Err(e) if e.is_unreachable() => return Err(e),
                Err(e) => {
                    warn!("Enrichment batch of {} failed: {}", batch.len(), e);
                    outputs.extend(std::iter::repeat_with(String::new).take(batch.len()));
                }
            }
        }

        Ok(outputs)
    }

    fn numbered_lines(batch: &[String]) -> String {
        let mut lines = String::new();
        for (i, text) in batch.iter().enumerate() {
            let _ = writeln!(lines, "{}. {}", i + 1, text);
        }
        lines
    }

    fn romaji_request(&self, batch: &[String]) -> ChatRequest {
        let prompt = format!(
            "Convert EACH Japanese line below to romaji (Hepburn), reading kanji in full.\n\
             - Return ONLY a JSON array of strings with exactly {count} elements.\n\
             - No explanations, kana readings or annotations.\n\
             - For lines that are not Japanese, return an empty string.\n\
             \n\
             Example:\n\
             Input: [\"北野です。\",\"失礼ですが、どなたですか？\"]\n\
             Output: [\"Kitano desu.\",\"Shitsurei desu ga, donata desu ka?\"]\n\
             \n\
             Lines: {count}\n\
             {lines}\n\
             Return:\n\
             [\"...\",\"...\", ...]",
            count = batch.len(),
            lines = Self::numbered_lines(batch),
        );

        ChatRequest::new(
            "You are a precise Japanese-to-romaji (Hepburn) transliteration engine.",
            prompt,
            0.1,
        )
    }

    fn translate_request(&self, batch: &[String]) -> ChatRequest {
        let prompt = format!(
            "Translate EACH line below into natural, clear {target}.\n\
             Return ONLY a JSON array of strings with exactly {count} elements, no explanations.\n\
             If a line is already {target}, keep it unchanged.\n\
             \n\
             Lines: {count}\n\
             {lines}\n\
             Return:\n\
             [\"...\",\"...\", ...]",
            target = self.target_language,
            count = batch.len(),
            lines = Self::numbered_lines(batch),
        );

        ChatRequest::new("You are an accurate translation assistant.", prompt, 0.2)
    }
}
