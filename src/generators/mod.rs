//! Media generators.
//!
//! Each generator turns its inputs into one file at a caller-chosen path and
//! reports the result as an [`Outcome`]. Generators never return errors:
//! every failure becomes a fallback or a `None` path, with the reason logged.

mod audio;
mod image;
mod video;

use std::fmt;
use std::path::PathBuf;

pub use self::audio::{plan_synthesis, AudioSynthesizer, SynthesisState};
pub use self::image::{ImageGenerator, MOOD_QUERY_SUFFIX};
pub use self::video::{VideoComposer, MISSING_INPUTS_MESSAGE};

/// Where an artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// An existing file was reused
    Cached,
    /// Downloaded from stock-photo search
    PhotoSearch,
    /// Copied from the bundled placeholder image
    FallbackImage,
    /// Premium voice synthesis
    PremiumVoice,
    /// Free multi-language synthesis
    FreeVoice,
    /// Composed from image and audio
    Composed,
    /// Nothing was produced
    Failed,
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArtifactSource::Cached => "cached",
            ArtifactSource::PhotoSearch => "photo search",
            ArtifactSource::FallbackImage => "fallback image",
            ArtifactSource::PremiumVoice => "premium voice",
            ArtifactSource::FreeVoice => "free voice",
            ArtifactSource::Composed => "composed",
            ArtifactSource::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Result of one generation call.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Path of the produced artifact, or `None` when generation failed
    pub path: Option<PathBuf>,
    pub source: ArtifactSource,
    /// Diagnostic lines, collected only when the call asked for them
    pub debug_lines: Vec<String>,
    /// Produced, but a requested post-processing step could not be applied
    pub degraded: bool,
}

impl Outcome {
    pub fn cached(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            source: ArtifactSource::Cached,
            debug_lines: Vec::new(),
            degraded: false,
        }
    }

    pub fn is_produced(&self) -> bool {
        self.path.is_some()
    }
}

/// Diagnostics sink for one generation call.
///
/// Every line goes to the `log` facade; lines are also kept for the
/// [`Outcome`] when the caller enabled debug output.
pub(crate) struct DebugLog {
    enabled: bool,
    lines: Vec<String>,
}

impl DebugLog {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            lines: Vec::new(),
        }
    }

    pub(crate) fn info(&mut self, message: String) {
        log::info!("{}", message);
        self.keep(message);
    }

    pub(crate) fn debug(&mut self, message: String) {
        log::debug!("{}", message);
        self.keep(message);
    }

    pub(crate) fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.keep(message);
    }

    fn keep(&mut self, message: String) {
        if self.enabled {
            self.lines.push(message);
        }
    }

    pub(crate) fn finish(self, path: Option<PathBuf>, source: ArtifactSource) -> Outcome {
        Outcome {
            path,
            source,
            debug_lines: self.lines,
            degraded: false,
        }
    }

    pub(crate) fn failed(self) -> Outcome {
        self.finish(None, ArtifactSource::Failed)
    }
}
