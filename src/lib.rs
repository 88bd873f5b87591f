//! media-studio library crate.
//!
//! Turns a text prompt into three artifacts that share one key: a stock
//! photo, a spoken narration and a video of the photo held for the length of
//! the narration. The binary in `main.rs` is a thin front end over
//! [`studio::Studio`].

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod ffmpeg;
pub mod generators;
pub mod imaging;
pub mod language;
pub mod prompt;
pub mod providers;
pub mod sanitize;
pub mod studio;
pub mod translator;

pub use artifacts::{ArtifactKind, ArtifactStore};
pub use config::Config;
pub use generators::{ArtifactSource, AudioSynthesizer, ImageGenerator, Outcome, VideoComposer};
pub use language::Language;
pub use sanitize::sanitize;
pub use studio::{GenerationRequest, StageOptions, Studio, StudioReport};
pub use translator::Translator;
