//! Blaze command-line entry point.

use anyhow::Result;
use blaze::cli::{Cli, Commands, build::build, watch::watch};
use blaze::config::BlazeConfig;
use clap::{ColorChoice, Parser};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    blaze::core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    blaze::logger::set_verbose(cli.verbose);

    let config = BlazeConfig::load_or_default(&cli.config)?.resolve(cli.pass_args().mode)?;

    match &cli.command {
        Commands::Build { args } => build(config, args),
        Commands::Watch { args } => watch(config, args),
    }
}
