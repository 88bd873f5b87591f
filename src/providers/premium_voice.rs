//! PremiumVoiceClient - high quality English speech via the premium synthesis API.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::{build_http_client, check_status, with_retry, ProviderError, RetryPolicy};
use crate::config::{mask_secret, Config, VoiceConfig};

/// Synthesis can take a while for long prompts; this bounds a hung request.
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(120);

/// Request body for text-to-speech.
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

/// Client for the premium voice-synthesis service.
pub struct PremiumVoiceClient {
    api_key: String,
    base_url: String,
    voice: VoiceConfig,
    http_client: reqwest::Client,
    retry: RetryPolicy,
}

impl PremiumVoiceClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::MissingApiKey` when no synthesis key is configured.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let api_key = config
            .keys
            .voice_synthesis
            .clone()
            .ok_or(ProviderError::MissingApiKey)?;
        Self::with_base_url(
            api_key,
            config.endpoints.premium_voice.clone(),
            config.voice.clone(),
            RetryPolicy::from(&config.network),
        )
    }

    /// Build a client against a custom base URL. Useful for testing against a mock server.
    pub fn with_base_url(
        api_key: String,
        base_url: String,
        voice: VoiceConfig,
        retry: RetryPolicy,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        log::debug!("Premium voice key loaded: {}", mask_secret(&api_key));

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            voice,
            http_client: build_http_client(SYNTHESIS_TIMEOUT)?,
            retry,
        })
    }

    pub fn voice_id(&self) -> &str {
        &self.voice.voice_id
    }

    /// Synthesize `text` with the configured voice and stream the MP3 to `dest`.
    ///
    /// Returns the number of bytes written.
    pub async fn synthesize_to(&self, text: &str, dest: &Path) -> Result<u64, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyText);
        }

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice.voice_id);
        let url = url.as_str();
        let body = SpeechRequest {
            text,
            model_id: &self.voice.model_id,
            voice_settings: VoiceSettings {
                stability: self.voice.stability,
                similarity_boost: self.voice.similarity_boost,
            },
        };
        let body = &body;

        let response = with_retry(&self.retry, "Premium synthesis", || async move {
            let response = self
                .http_client
                .post(url)
                .header("xi-api-key", &self.api_key)
                .header("Accept", "audio/mpeg")
                .json(body)
                .send()
                .await?;
            check_status(response, "Premium synthesis").await
        })
        .await?;

        // Stream the response body to disk
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;

        if written == 0 {
            return Err(ProviderError::MalformedResponse(
                "premium synthesis returned an empty body".to_string(),
            ));
        }

        Ok(written)
    }
}
