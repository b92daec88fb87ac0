use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ender")]
#[command(about = "Compile endermite component projects into data packs")]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Build the project and write the data pack.
    Build(BuildArgs),
    /// Build the project without writing anything.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub(crate) struct BuildArgs {
    #[arg(long = "project-dir", default_value = ".")]
    pub(crate) project_dir: PathBuf,
    #[arg(long = "output-dir")]
    pub(crate) output_dir: PathBuf,
    #[arg(long = "overwrite")]
    pub(crate) overwrite: bool,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "project-dir", default_value = ".")]
    pub(crate) project_dir: PathBuf,
}
