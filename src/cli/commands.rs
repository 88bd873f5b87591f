//! Subcommand handlers.
//!
//! Each handler returns `Err(message)` for failures the user must act on;
//! `main` prints the message and exits non-zero.

use std::path::{Path, PathBuf};

use super::args::{ConfigAction, PromptArgs, StageFlags};
use crate::artifacts::ArtifactStore;
use crate::config::{
    self, Config, DEFAULT_CONFIG_TEMPLATE, PHOTO_SEARCH_KEY_ENV, VOICE_SYNTHESIS_KEY_ENV,
};
use crate::generators::Outcome;
use crate::language::Language;
use crate::studio::{derive_key, GenerationRequest, StageOptions, Studio, StudioReport};
use crate::translator::Translator;

/// A single stage run on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Image,
    Audio,
    Video,
}

/// Load the effective configuration.
///
/// An explicit `--config` file must exist; the default file is optional and
/// a broken one only produces a warning. Environment keys and `--output-dir`
/// are applied on top.
pub fn load_config(path: Option<&Path>, output_dir: Option<PathBuf>) -> Result<Config, String> {
    let config = match path {
        Some(path) => Config::load_from_explicit(path).map_err(|e| e.to_string())?,
        None => Config::load(None).unwrap_or_else(|e| {
            log::warn!("Failed to load config file: {}. Using default settings.", e);
            Config::default()
        }),
    };

    let mut config = config.with_env_overrides();
    if let Some(dir) = output_dir {
        config.paths.output_dir = dir;
    }
    Ok(config)
}

/// Warn about providers that will be skipped for lack of a key.
pub fn warn_missing_keys(config: &Config) {
    if config.keys.photo_search.is_none() {
        log::warn!(
            "{} not set; images will use the fallback placeholder",
            PHOTO_SEARCH_KEY_ENV
        );
    }
    if config.keys.voice_synthesis.is_none() {
        log::warn!(
            "{} not set; narration will use free synthesis",
            VOICE_SYNTHESIS_KEY_ENV
        );
    }
}

pub fn stage_options(flags: &StageFlags, debug: bool) -> StageOptions {
    StageOptions {
        watermark: flags.watermark,
        mood: flags.mood,
        force: flags.force,
        debug,
    }
}

/// Run every stage for one prompt and print the report.
pub async fn run_generate(
    config: &Config,
    prompt: &PromptArgs,
    options: StageOptions,
) -> Result<(), String> {
    warn_missing_keys(config);
    let studio = Studio::new(config).map_err(|e| e.to_string())?;

    let request = GenerationRequest {
        prompt: prompt.prompt.clone(),
        source: prompt.from.into(),
        target: prompt.to.into(),
        options,
    };
    let report = studio.run(&request).await.map_err(|e| e.to_string())?;
    print_report(&report);
    Ok(())
}

/// Run a single stage for one prompt and print its outcome.
pub async fn run_stage(
    config: &Config,
    stage: Stage,
    prompt: &PromptArgs,
    options: StageOptions,
) -> Result<(), String> {
    let studio = Studio::new(config).map_err(|e| e.to_string())?;
    let prepared = studio
        .prepare(&prompt.prompt, prompt.from.into(), prompt.to.into())
        .await
        .map_err(|e| e.to_string())?;

    println!("Key: {}", prepared.key);
    let outcome = match stage {
        Stage::Image => studio.image(&prepared, options).await,
        Stage::Audio => studio.audio(&prepared, options).await,
        Stage::Video => studio.video(&prepared, options).await,
    };
    print_outcome(stage_label(stage), &outcome);

    if outcome.is_produced() {
        Ok(())
    } else {
        Err(format!("{} was not produced", stage_label(stage)))
    }
}

/// Print the key `text` is stored under when generated without translation.
pub fn run_sanitize(text: &str, language: Language) {
    println!("{}", derive_key(text, text, language));
}

pub async fn run_translate(
    config: &Config,
    text: &str,
    from: Language,
    to: Language,
) -> Result<(), String> {
    let translator = Translator::new(config).map_err(|e| e.to_string())?;
    println!("{}", translator.translate_from(text, from, to).await);
    Ok(())
}

/// List stored artifacts per kind.
pub fn run_artifacts(config: &Config) -> Result<(), String> {
    let store = ArtifactStore::new(config.paths.output_dir.clone());
    let entries = store
        .list_entries()
        .map_err(|e| format!("Failed to read {}: {}", store.root().display(), e))?;

    if entries.is_empty() {
        println!("No artifacts in {}", store.root().display());
        return Ok(());
    }

    println!("Artifacts in {}:", store.root().display());
    println!();
    for entry in &entries {
        println!(
            "  {:<6} {:<50} {:>10}",
            entry.kind.to_string(),
            entry.key,
            format_size(entry.size_bytes)
        );
    }
    println!();
    let total = store
        .total_size_bytes()
        .map_err(|e| format!("Failed to read {}: {}", store.root().display(), e))?;
    println!("Total: {} artifacts, {}", entries.len(), format_size(total));
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    config_path: Option<&Path>,
) -> Result<(), String> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(config::default_path);

    match action {
        ConfigAction::Show => {
            if path.exists() {
                println!("# Config file: {} (exists)", path.display());
            } else {
                println!("# Config file: {} (not found, using defaults)", path.display());
            }
            println!();
            print!("{}", config.to_display_toml());
            Ok(())
        }
        ConfigAction::Init => {
            if path.exists() {
                return Err(format!(
                    "Config file already exists: {}\nUse 'media-studio config show' to view current settings.",
                    path.display()
                ));
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Error creating config directory: {}", e))?;
            }

            std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
                .map_err(|e| format!("Error writing config file: {}", e))?;

            println!("Created config file: {}", path.display());
            Ok(())
        }
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Image => "Image",
        Stage::Audio => "Audio",
        Stage::Video => "Video",
    }
}

fn print_report(report: &StudioReport) {
    println!("Key:  {}", report.key);
    println!("Text: {}", report.text);
    println!();
    print_outcome("Image", &report.image);
    print_outcome("Audio", &report.audio);
    print_outcome("Video", &report.video);
}

fn print_outcome(label: &str, outcome: &Outcome) {
    match &outcome.path {
        Some(path) if outcome.degraded => println!(
            "{}: {} ({}, incomplete)",
            label,
            path.display(),
            outcome.source
        ),
        Some(path) => println!("{}: {} ({})", label, path.display(), outcome.source),
        None => println!("{}: not produced", label),
    }
    for line in &outcome.debug_lines {
        println!("    {}", line);
    }
}

/// Format a byte count as a human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
