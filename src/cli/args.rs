//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::BuildMode;

/// Build-time media optimizer: budgeted AVIF/WebP transcoding, content-hash
/// caching and an obfuscated asset manifest.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path
    #[arg(short = 'C', long, global = true, default_value = crate::config::CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one pass over the input directory
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: PassArgs,
    },

    /// Build, then rerun a pass on every change until Ctrl+C
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: PassArgs,
    },
}

/// Arguments shared by `build` and `watch`.
#[derive(clap::Args, Debug, Clone)]
pub struct PassArgs {
    /// Bundler output directory to optimize
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub path: PathBuf,

    /// Where to write the result (default: `<path>/../<name>-out`)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub out: Option<PathBuf>,

    /// Build mode; overrides `mode` in the config file
    #[arg(short, long, visible_alias = "env")]
    pub mode: Option<BuildMode>,

    /// Keep files already in the output directory
    #[arg(long)]
    pub no_clean: bool,

    /// Hide the progress line
    #[arg(short, long)]
    pub quiet: bool,
}

impl PassArgs {
    /// Output directory, defaulting to a sibling of the input.
    ///
    /// The default is named after the resolved input, so `-p .` yields
    /// `../<dir>-out` rather than a directory inside the input.
    pub fn out_dir(&self) -> PathBuf {
        if let Some(out) = &self.out {
            return out.clone();
        }
        let input = self.path.canonicalize().unwrap_or_else(|_| self.path.clone());
        let name = input
            .file_name()
            .map_or_else(|| "assets".into(), |n| n.to_string_lossy().into_owned());
        input.with_file_name(format!("{name}-out"))
    }
}

impl Cli {
    pub fn pass_args(&self) -> &PassArgs {
        match &self.command {
            Commands::Build { args } | Commands::Watch { args } => args,
        }
    }
}
