//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{Args, Command, ConfigAction, PromptArgs, StageFlags};
pub use commands::{
    format_size, handle_config_action, load_config, run_artifacts, run_generate, run_sanitize,
    run_stage, run_translate, stage_options, warn_missing_keys, Stage,
};
pub use enums::LanguageArg;
