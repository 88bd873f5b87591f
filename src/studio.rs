//! Studio - turns one prompt into an image, a narration and a video.
//!
//! The studio owns one instance of every component, all built from a single
//! [`Config`]. Each stage checks the artifact store first and only generates
//! when no matching artifact exists. Generation for one (kind, key) pair is
//! serialized with the store's lock.

use std::path::PathBuf;

use crate::artifacts::{ArtifactKind, ArtifactStore};
use crate::config::Config;
use crate::generators::{ArtifactSource, AudioSynthesizer, ImageGenerator, Outcome, VideoComposer};
use crate::language::Language;
use crate::prompt::{validate_prompt, PromptError};
use crate::providers::ProviderError;
use crate::sanitize::{sanitize, MAX_KEY_LEN};
use crate::translator::Translator;

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("invalid prompt: {0}")]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("output directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Flags shared by the generation stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageOptions {
    pub watermark: bool,
    pub mood: bool,
    /// Regenerate even when a matching artifact exists
    pub force: bool,
    /// Collect diagnostic lines in each outcome
    pub debug: bool,
}

/// A full prompt-to-video request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Language the prompt is written in
    pub source: Language,
    /// Language of the narration and of the text used for search
    pub target: Language,
    pub options: StageOptions,
}

impl GenerationRequest {
    /// An English-to-English request with default options.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            source: Language::English,
            target: Language::English,
            options: StageOptions::default(),
        }
    }
}

/// A validated, translated prompt and the key its artifacts are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPrompt {
    pub original: String,
    /// Text used for generation (translated when requested)
    pub text: String,
    pub key: String,
    pub language: Language,
}

/// Outcome of every stage of one request.
#[derive(Debug, Clone)]
pub struct StudioReport {
    pub key: String,
    pub text: String,
    pub image: Outcome,
    pub audio: Outcome,
    pub video: Outcome,
}

pub struct Studio {
    store: ArtifactStore,
    translator: Translator,
    images: ImageGenerator,
    audio: AudioSynthesizer,
    video: VideoComposer,
}

impl Studio {
    /// Build every component from `config` and create the output directories.
    pub fn new(config: &Config) -> Result<Self, StudioError> {
        Ok(Self::from_parts(
            ArtifactStore::new_initialized(config.paths.output_dir.clone())?,
            Translator::new(config)?,
            ImageGenerator::new(config)?,
            AudioSynthesizer::new(config)?,
            VideoComposer::new(config),
        ))
    }

    pub fn from_parts(
        store: ArtifactStore,
        translator: Translator,
        images: ImageGenerator,
        audio: AudioSynthesizer,
        video: VideoComposer,
    ) -> Self {
        Self {
            store,
            translator,
            images,
            audio,
            video,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run every stage for `request` in order: translate, image, audio, then
    /// the video from both.
    pub async fn run(&self, request: &GenerationRequest) -> Result<StudioReport, StudioError> {
        let prepared = self
            .prepare(&request.prompt, request.source, request.target)
            .await?;
        log::info!("Generating media for key '{}'", prepared.key);

        let image = self.image(&prepared, request.options).await;
        let audio = self.audio(&prepared, request.options).await;
        let video = self.video(&prepared, request.options).await;

        Ok(StudioReport {
            key: prepared.key,
            text: prepared.text,
            image,
            audio,
            video,
        })
    }

    /// Validate `prompt`, translate it from `source` into `target` and derive
    /// its key.
    pub async fn prepare(
        &self,
        prompt: &str,
        source: Language,
        target: Language,
    ) -> Result<PreparedPrompt, PromptError> {
        let original = validate_prompt(prompt)?;
        let text = self.translator.translate_from(original, source, target).await;
        let key = derive_key(original, &text, target);
        Ok(PreparedPrompt {
            original: original.to_string(),
            text,
            key,
            language: target,
        })
    }

    /// Produce (or reuse) the image for `prepared`.
    pub async fn image(&self, prepared: &PreparedPrompt, options: StageOptions) -> Outcome {
        let kind = ArtifactKind::Image;
        let path = self.store.path_for(kind, &prepared.key);
        let fingerprint = ArtifactStore::fingerprint(&[
            "image",
            &prepared.text,
            flag(options.watermark),
            flag(options.mood),
        ]);

        let _guard = self.store.lock(kind, &prepared.key).await;
        if let Some(cached) = self.cached(kind, &prepared.key, &fingerprint, options) {
            return cached;
        }

        let outcome = self
            .images
            .generate(
                &prepared.text,
                &path,
                options.watermark,
                options.mood,
                options.debug,
            )
            .await;

        // A placeholder, or an image missing its requested watermark, is
        // stored under a fingerprint no request produces, so the next request
        // generates again.
        let recorded = if outcome.source == ArtifactSource::FallbackImage {
            format!("{}-fallback", fingerprint)
        } else if outcome.degraded {
            format!("{}-degraded", fingerprint)
        } else {
            fingerprint
        };
        self.record(&outcome, &recorded);
        outcome
    }

    /// Produce (or reuse) the narration for `prepared` in its language.
    pub async fn audio(&self, prepared: &PreparedPrompt, options: StageOptions) -> Outcome {
        let kind = ArtifactKind::Audio;
        let path = self.store.path_for(kind, &prepared.key);
        let fingerprint =
            ArtifactStore::fingerprint(&["audio", &prepared.text, prepared.language.code()]);

        let _guard = self.store.lock(kind, &prepared.key).await;
        if let Some(cached) = self.cached(kind, &prepared.key, &fingerprint, options) {
            return cached;
        }

        let outcome = self
            .audio
            .generate(&prepared.text, &path, options.debug, prepared.language)
            .await;
        self.record(&outcome, &fingerprint);
        outcome
    }

    /// Produce (or reuse) the video from the stored image and audio for
    /// `prepared`. Both must already exist.
    pub async fn video(&self, prepared: &PreparedPrompt, options: StageOptions) -> Outcome {
        let kind = ArtifactKind::Video;
        let image = self.store.path_for(ArtifactKind::Image, &prepared.key);
        let audio = self.store.path_for(ArtifactKind::Audio, &prepared.key);
        let path = self.store.path_for(kind, &prepared.key);

        // A regenerated input invalidates the video built from it
        let image_fp = self.store.recorded_fingerprint(&image).unwrap_or_default();
        let audio_fp = self.store.recorded_fingerprint(&audio).unwrap_or_default();
        let fingerprint = ArtifactStore::fingerprint(&[
            "video",
            &prepared.text,
            flag(options.watermark),
            flag(options.mood),
            &image_fp,
            &audio_fp,
        ]);

        let _guard = self.store.lock(kind, &prepared.key).await;
        if image.is_file() && audio.is_file() {
            if let Some(cached) = self.cached(kind, &prepared.key, &fingerprint, options) {
                return cached;
            }
        }

        let outcome = self
            .video
            .generate(
                &prepared.text,
                &image,
                &audio,
                &path,
                options.watermark,
                options.mood,
                options.debug,
            )
            .await;
        self.record(&outcome, &fingerprint);
        outcome
    }

    fn cached(
        &self,
        kind: ArtifactKind,
        key: &str,
        fingerprint: &str,
        options: StageOptions,
    ) -> Option<Outcome> {
        if options.force {
            log::debug!("Regenerating {} for '{}' (forced)", kind, key);
            return None;
        }
        let path = self.store.get(kind, key, fingerprint)?;
        log::info!("Using cached {} {}", kind, path.display());
        let mut outcome = Outcome::cached(path.clone());
        if options.debug {
            outcome
                .debug_lines
                .push(format!("Cache hit for {} at {}", kind, path.display()));
        }
        Some(outcome)
    }

    fn record(&self, outcome: &Outcome, fingerprint: &str) {
        if let Some(path) = &outcome.path {
            if let Err(e) = self.store.record_fingerprint(path, fingerprint) {
                log::warn!("Could not record fingerprint for {}: {}", path.display(), e);
            }
        }
    }

    /// Paths every stage would use for `key`, in image, audio, video order.
    pub fn artifact_paths(&self, key: &str) -> [PathBuf; 3] {
        ArtifactKind::ALL.map(|kind| self.store.path_for(kind, key))
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Key for a prepared prompt.
///
/// Normally the sanitized generation text. Text in a non-Latin script
/// sanitizes to separators only, so then the original prompt is used with the
/// language code appended, and failing that a hash of the text.
pub fn derive_key(original: &str, text: &str, language: Language) -> String {
    let key = sanitize(text);
    if has_alphanumeric(&key) {
        return key;
    }

    let suffix = format!("_{}", language.code());
    let mut fallback = sanitize(original);
    if has_alphanumeric(&fallback) {
        fallback.truncate(MAX_KEY_LEN - suffix.len());
        fallback.push_str(&suffix);
        return fallback;
    }

    let digest = ArtifactStore::fingerprint(&[text]);
    format!("prompt_{}{}", &digest[..12], suffix)
}

fn has_alphanumeric(key: &str) -> bool {
    key.chars().any(|c| c.is_ascii_alphanumeric())
}
