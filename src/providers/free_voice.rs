//! FreeVoiceClient - multi-language speech via the public translate TTS endpoint.
//!
//! The endpoint only accepts short inputs, so text is split into chunks of at
//! most [`MAX_CHUNK_CHARS`] characters on word boundaries. Each chunk comes
//! back as a standalone MP3 stream; concatenating the streams in order yields
//! a playable file.

use std::time::Duration;

use super::{build_http_client, check_status, with_retry, ProviderError, RetryPolicy};
use crate::config::Config;

/// Longest text the endpoint accepts per request.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Synthesis of a multi-chunk prompt is slower than a single search call.
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the free multi-language synthesis engine.
pub struct FreeVoiceClient {
    base_url: String,
    http_client: reqwest::Client,
    retry: RetryPolicy,
}

impl FreeVoiceClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        Self::with_base_url(
            config.endpoints.free_voice.clone(),
            RetryPolicy::from(&config.network),
        )
    }

    /// Build a client against a custom base URL. Useful for testing against a mock server.
    pub fn with_base_url(base_url: String, retry: RetryPolicy) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: build_http_client(SYNTHESIS_TIMEOUT)?,
            retry,
        })
    }

    /// Synthesize `text` in `language_code` and return the MP3 bytes.
    pub async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let language_code = language_code.trim();
        if language_code.is_empty() || !language_code.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            return Err(ProviderError::UnsupportedLanguage(language_code.to_string()));
        }

        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ProviderError::EmptyText);
        }

        let url = format!("{}/translate_tts", self.base_url);
        let total = chunks.len();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            log::debug!("Free synthesis chunk {}/{}: {:?}", idx + 1, total, chunk);
            let bytes = self
                .synthesize_chunk(&url, chunk, language_code, idx, total)
                .await?;
            if bytes.is_empty() {
                return Err(ProviderError::MalformedResponse(format!(
                    "free synthesis returned no audio for chunk {}",
                    idx + 1
                )));
            }
            audio.extend_from_slice(&bytes);
        }

        Ok(audio)
    }

    async fn synthesize_chunk(
        &self,
        url: &str,
        chunk: &str,
        language_code: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, ProviderError> {
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();
        let query = [
            ("ie", "UTF-8"),
            ("q", chunk),
            ("tl", language_code),
            ("client", "tw-ob"),
            ("total", total.as_str()),
            ("idx", idx.as_str()),
            ("textlen", textlen.as_str()),
        ];
        let query = &query;

        with_retry(&self.retry, "Free synthesis", || async move {
            let response = self
                .http_client
                .get(url)
                .query(query)
                .send()
                .await?;
            let response = check_status(response, "Free synthesis").await?;
            let bytes = response.bytes().await?;
            Ok::<_, ProviderError>(bytes.to_vec())
        })
        .await
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Splits on whitespace; a single word longer than `max_chars` is cut into
/// fixed-size pieces. Whitespace-only input yields no chunks.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { word_len + 1 };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
