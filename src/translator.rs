//! Translator - fail-open prompt translation.
//!
//! Translation is an enhancement. When the service is unavailable the prompt
//! is used as typed, so image and audio generation always proceed.

use crate::config::Config;
use crate::language::Language;
use crate::providers::{ProviderError, TranslationClient};

/// The single translator used by every stage of the studio.
pub struct Translator {
    client: TranslationClient,
    source: Language,
}

impl Translator {
    /// Build a translator whose source language is English.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        Ok(Self::with_client(TranslationClient::new(config)?, Language::English))
    }

    pub fn with_client(client: TranslationClient, source: Language) -> Self {
        Self { client, source }
    }

    pub fn source(&self) -> Language {
        self.source
    }

    /// Return a translator for prompts typed in `source`.
    pub fn from_language(self, source: Language) -> Self {
        Self { source, ..self }
    }

    /// Translate `text` into `target`.
    ///
    /// Returns `text` unchanged, without a network call, when `target` is the
    /// source language. Any service failure also returns `text` unchanged.
    pub async fn translate(&self, text: &str, target: Language) -> String {
        self.translate_from(text, self.source, target).await
    }

    /// Like [`Translator::translate`] with an explicit source language.
    pub async fn translate_from(&self, text: &str, source: Language, target: Language) -> String {
        if source == target {
            return text.to_string();
        }

        match self.client.translate(text, source.code(), target.code()).await {
            Ok(translated) => {
                log::info!("Translated prompt from {} to {}", source, target);
                log::debug!("Translation: {:?} -> {:?}", text, translated);
                translated
            }
            Err(e) => {
                log::warn!(
                    "Translation from {} to {} failed ({}); using original text",
                    source,
                    target,
                    e
                );
                text.to_string()
            }
        }
    }
}
