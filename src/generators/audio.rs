//! AudioSynthesizer - premium English voice with a free multi-language fallback.
//!
//! Engine selection is a small state machine:
//!
//! ```text
//! NonEnglish ──────────────┐
//! EnglishNoKey ────────────┤
//! EnglishPremiumAttempt ───┼─(error)─> FreeSynthesis ─┬─> Done
//!         │                                            └─> Failed
//!         └─(ok)─> Done
//! ```

use std::path::Path;

use super::{ArtifactSource, DebugLog, Outcome};
use crate::artifacts::{persist, temp_sibling, write_atomic};
use crate::config::Config;
use crate::language::Language;
use crate::providers::{FreeVoiceClient, PremiumVoiceClient, ProviderError};

/// States of the engine-selection machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisState {
    NonEnglish,
    EnglishPremiumAttempt,
    EnglishNoKey,
    FreeSynthesis,
    Done,
    Failed,
}

/// Initial state for a request in `language`.
///
/// The premium engine is English-only and needs a key.
pub fn plan_synthesis(language: Language, has_premium_key: bool) -> SynthesisState {
    match (language, has_premium_key) {
        (Language::English, true) => SynthesisState::EnglishPremiumAttempt,
        (Language::English, false) => SynthesisState::EnglishNoKey,
        _ => SynthesisState::NonEnglish,
    }
}

pub struct AudioSynthesizer {
    premium: Option<PremiumVoiceClient>,
    free: FreeVoiceClient,
}

impl AudioSynthesizer {
    /// Build from configuration. A missing premium key disables the premium
    /// engine rather than failing.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let premium = match PremiumVoiceClient::new(config) {
            Ok(client) => Some(client),
            Err(ProviderError::MissingApiKey) => {
                log::debug!("No premium voice key configured; using free synthesis only");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self::with_clients(premium, FreeVoiceClient::new(config)?))
    }

    pub fn with_clients(premium: Option<PremiumVoiceClient>, free: FreeVoiceClient) -> Self {
        Self { premium, free }
    }

    pub fn has_premium(&self) -> bool {
        self.premium.is_some()
    }

    /// Speak `text` in `language` and save the MP3 at `dest`.
    pub async fn generate(
        &self,
        text: &str,
        dest: &Path,
        debug: bool,
        language: Language,
    ) -> Outcome {
        let mut log = DebugLog::new(debug);
        let mut source = ArtifactSource::FreeVoice;
        let mut state = plan_synthesis(language, self.premium.is_some());

        loop {
            log.debug(format!("Audio synthesis state: {:?}", state));
            state = match state {
                SynthesisState::NonEnglish => {
                    log.debug(format!(
                        "Premium voice is English-only; using free synthesis for {}",
                        language
                    ));
                    SynthesisState::FreeSynthesis
                }
                SynthesisState::EnglishNoKey => {
                    log.debug("No premium voice key; using free synthesis".to_string());
                    SynthesisState::FreeSynthesis
                }
                SynthesisState::EnglishPremiumAttempt => match &self.premium {
                    Some(premium) => match synthesize_premium(premium, text, dest).await {
                        Ok(bytes) => {
                            log.info(format!(
                                "Premium voice {} wrote {} bytes to {}",
                                premium.voice_id(),
                                bytes,
                                dest.display()
                            ));
                            source = ArtifactSource::PremiumVoice;
                            SynthesisState::Done
                        }
                        Err(e) => {
                            log.warn(format!(
                                "Premium synthesis failed ({}); falling back to free synthesis",
                                e
                            ));
                            SynthesisState::FreeSynthesis
                        }
                    },
                    None => SynthesisState::FreeSynthesis,
                },
                SynthesisState::FreeSynthesis => {
                    match self.synthesize_free(text, dest, language).await {
                        Ok(bytes) => {
                            log.info(format!(
                                "Free synthesis ({}) wrote {} bytes to {}",
                                language.code(),
                                bytes,
                                dest.display()
                            ));
                            source = ArtifactSource::FreeVoice;
                            SynthesisState::Done
                        }
                        Err(e) => {
                            log.warn(format!("Free synthesis failed: {}", e));
                            SynthesisState::Failed
                        }
                    }
                }
                SynthesisState::Done => return log.finish(Some(dest.to_path_buf()), source),
                SynthesisState::Failed => return log.failed(),
            };
        }
    }

    async fn synthesize_free(
        &self,
        text: &str,
        dest: &Path,
        language: Language,
    ) -> Result<usize, ProviderError> {
        let audio = self.free.synthesize(text, language.code()).await?;
        write_atomic(dest, &audio)?;
        Ok(audio.len())
    }
}

/// Stream premium audio into a temporary sibling of `dest`, then move it into place.
async fn synthesize_premium(
    premium: &PremiumVoiceClient,
    text: &str,
    dest: &Path,
) -> Result<u64, ProviderError> {
    let temp = temp_sibling(dest)?;
    let written = premium.synthesize_to(text, temp.path()).await?;
    persist(temp, dest)?;
    Ok(written)
}
