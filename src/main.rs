//! SoundDeck CLI - Soundboard Clip Tools
//!
//! Command-line interface for the SoundDeck audio engine.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use sounddeck::cli::commands;
use sounddeck::cli::{Cli, Commands};
use sounddeck::EngineConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("SoundDeck v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Some(cmd) => handle_command(cmd, &config),
        None => {
            println!("SoundDeck v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &EngineConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Info { path } => commands::show_info(&path, config)?,
        Commands::Tone {
            frequency,
            waveform,
            duration,
            output,
        } => commands::tone(frequency, waveform, duration, &output)?,
        Commands::Process {
            input,
            output,
            stages,
        } => commands::process(&input, &output, stages.into(), config)?,
        Commands::Batch {
            input,
            output,
            stages,
        } => {
            commands::batch(&input, &output, stages.into(), config)?;
        }
        Commands::Chop {
            input,
            start,
            end,
            output,
        } => commands::chop(&input, start, end, &output, config)?,
        Commands::Split { input, output } => {
            commands::split(&input, &output, config)?;
        }
        Commands::Demo { library } => {
            commands::seed_demo(&library)?;
        }
        Commands::Render {
            library,
            ids,
            output,
            sample_rate,
            max_secs,
        } => commands::render(&library, &ids, &output, sample_rate, max_secs, config)?,
        Commands::Export { library, output } => commands::export(&library, &output, config)?,
        Commands::Import {
            library,
            bundle,
            replace,
        } => commands::import(&library, &bundle, replace)?,
    }
    Ok(())
}
