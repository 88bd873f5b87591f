use clap::Parser;

use media_studio::cli::{self, Args, Command, Stage};

/// Load .env file
///
/// Loads environment variables from .env file in the working directory.
/// Does not override existing environment variables.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

/// Install the logger. `RUST_LOG` takes precedence over `--debug`.
fn init_logging(debug: bool) {
    let default_filter = if debug {
        "info,media_studio=debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(debug)
        .init();
}

fn run(args: Args) -> Result<(), String> {
    if let Command::Sanitize { text, language } = &args.command {
        cli::run_sanitize(text, (*language).into());
        return Ok(());
    }

    let config = cli::load_config(args.config.as_deref(), args.output_dir.clone())?;
    let debug = args.debug;

    match args.command {
        Command::Config { action } => {
            cli::handle_config_action(action, &config, args.config.as_deref())
        }
        Command::Artifacts => cli::run_artifacts(&config),
        command => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| format!("Failed to create async runtime: {}", e))?;

            rt.block_on(async {
                match command {
                    Command::Generate { prompt, flags } => {
                        cli::run_generate(&config, &prompt, cli::stage_options(&flags, debug))
                            .await
                    }
                    Command::Image { prompt, flags } => {
                        let options = cli::stage_options(&flags, debug);
                        cli::run_stage(&config, Stage::Image, &prompt, options).await
                    }
                    Command::Audio { prompt, force } => {
                        let flags = cli::StageFlags {
                            force,
                            ..Default::default()
                        };
                        let options = cli::stage_options(&flags, debug);
                        cli::run_stage(&config, Stage::Audio, &prompt, options).await
                    }
                    Command::Video { prompt, flags } => {
                        let options = cli::stage_options(&flags, debug);
                        cli::run_stage(&config, Stage::Video, &prompt, options).await
                    }
                    Command::Translate { text, to, from } => {
                        cli::run_translate(&config, &text, from.into(), to.into()).await
                    }
                    Command::Sanitize { .. } | Command::Artifacts | Command::Config { .. } => {
                        Ok(())
                    }
                }
            })
        }
    }
}

fn main() {
    // Load .env file before anything else
    load_env();

    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
