use std::ffi::OsString;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use em_api::{
    build_project, load_project_dir, write_output, DirectoryPackWriter, LoadedProject, PackHandle,
};
use tracing::info;

mod cli_args;
mod error_map;

pub(crate) use cli_args::{BuildArgs, CheckArgs, Cli, Mode};
pub(crate) use error_map::{emit_error, json_string};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return error.exit_code(),
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Mode::Build(args) => run_build(args),
        Mode::Check(args) => run_check(args),
    }
}

fn load(project_dir: &Path) -> anyhow::Result<LoadedProject> {
    load_project_dir(project_dir)
        .with_context(|| format!("Failed to load project from {}", project_dir.display()))
}

fn run_build(args: BuildArgs) -> anyhow::Result<i32> {
    let loaded = load(&args.project_dir)?;
    let output = build_project(&loaded.project, loaded.components)
        .with_context(|| format!("Failed to build project \"{}\"", loaded.project.name))?;

    let pack_root = args.output_dir.join(&loaded.project.name);
    let writer = DirectoryPackWriter::new(&pack_root, args.overwrite);
    let handle = write_output(&output, writer)
        .with_context(|| format!("Failed to write pack to {}", pack_root.display()))?;
    info!(pack = %pack_root.display(), "build finished");

    println!("RESULT:OK");
    if let PackHandle::Directory { path, files } = handle {
        println!("PACK_JSON:{}", json_string(&path.to_string_lossy()));
        println!("FILES:{}", files);
    }
    println!("FUNCTIONS:{}", output.functions.len());
    println!("TAGS:{}", output.tags.len());
    Ok(0)
}

fn run_check(args: CheckArgs) -> anyhow::Result<i32> {
    let loaded = load(&args.project_dir)?;
    let output = build_project(&loaded.project, loaded.components)
        .with_context(|| format!("Failed to build project \"{}\"", loaded.project.name))?;

    println!("RESULT:OK");
    for artifact in output.artifacts() {
        println!("ARTIFACT:{}", artifact.location());
    }
    println!("FUNCTIONS:{}", output.functions.len());
    println!("TAGS:{}", output.tags.len());
    Ok(0)
}
