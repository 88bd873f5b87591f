//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::LanguageArg;

/// Turn a text prompt into an image, a narration and a short video
#[derive(Parser, Debug)]
#[command(name = "media-studio")]
#[command(version, about = "Turn a text prompt into an image, narration and video", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Image, audio and video for one prompt
    media-studio generate \"A farmer working in the field\"

    # Translate to Telugu first, watermark the image
    media-studio generate \"A farmer working in the field\" --to telugu --watermark

    # Only the narration, in Hindi
    media-studio audio \"Good morning\" --language hi

    # Key an untranslated Telugu prompt is stored under
    media-studio sanitize \"A farmer working in the field\" --language te")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging and per-stage diagnostics
    #[arg(long, global = true)]
    pub debug: bool,

    /// Directory holding images/, audio/ and videos/
    #[arg(long, short, global = true)]
    pub output_dir: Option<PathBuf>,
}

/// The prompt and the languages it is translated between.
#[derive(clap::Args, Debug, Clone)]
pub struct PromptArgs {
    /// Text prompt (at most 200 characters)
    pub prompt: String,

    /// Language the prompt is written in
    #[arg(long, default_value = "english")]
    pub from: LanguageArg,

    /// Language to translate into and narrate in
    #[arg(long, visible_alias = "language", short = 'l', default_value = "english")]
    pub to: LanguageArg,
}

/// Flags for the image and video stages.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct StageFlags {
    /// Composite the logo into the bottom-right corner of the image
    #[arg(long)]
    pub watermark: bool,

    /// Night-time search and a darkened video
    #[arg(long)]
    pub mood: bool,

    /// Regenerate even if a matching artifact exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translate, then generate image, audio and video
    Generate {
        #[command(flatten)]
        prompt: PromptArgs,
        #[command(flatten)]
        flags: StageFlags,
    },
    /// Generate only the image
    Image {
        #[command(flatten)]
        prompt: PromptArgs,
        #[command(flatten)]
        flags: StageFlags,
    },
    /// Generate only the narration
    Audio {
        #[command(flatten)]
        prompt: PromptArgs,
        /// Regenerate even if a matching artifact exists
        #[arg(long)]
        force: bool,
    },
    /// Compose the video from this prompt's existing image and audio
    Video {
        #[command(flatten)]
        prompt: PromptArgs,
        #[command(flatten)]
        flags: StageFlags,
    },
    /// Print the key an untranslated prompt's artifacts are stored under
    Sanitize {
        text: String,
        /// Language of the prompt
        #[arg(long, short, default_value = "english")]
        language: LanguageArg,
    },
    /// Translate a text
    Translate {
        text: String,
        /// Target language
        #[arg(long)]
        to: LanguageArg,
        /// Source language
        #[arg(long, default_value = "english")]
        from: LanguageArg,
    },
    /// List generated artifacts
    Artifacts,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Create default config file
    Init,
}
