use std::fs;
use std::path::{Path, PathBuf};

use em_compiler::{ComponentDefinition, ProjectDefinition};
use serde::de::DeserializeOwned;
use tracing::debug;
use walkdir::WalkDir;

use crate::manifest::{ComponentManifest, ProjectManifest};
use crate::EndermiteError;

pub const PROJECT_MANIFEST_FILE: &str = "project.json";
pub const COMPONENTS_DIR: &str = "components";

#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub root: PathBuf,
    pub project: ProjectDefinition,
    pub components: Vec<ComponentDefinition>,
}

/// Reads `project.json` and every `components/**/*.json` manifest under `dir`.
pub fn load_project_dir(dir: &Path) -> Result<LoadedProject, EndermiteError> {
    if !dir.is_dir() {
        return Err(EndermiteError::ProjectNotFound {
            path: dir.to_path_buf(),
        });
    }

    let manifest: ProjectManifest = read_json(&dir.join(PROJECT_MANIFEST_FILE))?;
    let project = manifest.to_definition();

    let mut components = Vec::new();
    for path in component_manifest_paths(&dir.join(COMPONENTS_DIR))? {
        let manifest: ComponentManifest = read_json(&path)?;
        let fallback = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| EndermiteError::manifest(&path, "file name is not valid UTF-8"))?;
        components.push(manifest.to_definition(&project.namespace, fallback));
    }
    debug!(
        project = %project.name,
        components = components.len(),
        "loaded project directory"
    );

    Ok(LoadedProject {
        root: dir.to_path_buf(),
        project,
        components,
    })
}

fn component_manifest_paths(dir: &Path) -> Result<Vec<PathBuf>, EndermiteError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|error| {
            let path = error.path().unwrap_or(dir).to_path_buf();
            let source = error
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            EndermiteError::io(path, source)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        paths.push(entry.into_path());
    }
    Ok(paths)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, EndermiteError> {
    let raw = fs::read_to_string(path).map_err(|source| EndermiteError::io(path, source))?;
    serde_json::from_str(&raw).map_err(|source| EndermiteError::Json {
        path: path.to_path_buf(),
        source,
    })
}
