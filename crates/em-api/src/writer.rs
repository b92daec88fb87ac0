use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::EndermiteError;

pub const PACK_FORMAT: u32 = 5;
pub const PACK_METADATA_FILE: &str = "pack.mcmeta";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackHandle {
    Memory { files: BTreeMap<String, String> },
    Directory { path: PathBuf, files: usize },
}

/// Sink for built artifacts. Paths are pack-relative with `/` separators.
pub trait PackWriter {
    fn write(&mut self, relative_path: &str, content: &str) -> Result<(), EndermiteError>;

    fn write_tag(&mut self, relative_path: &str, members: &[String]) -> Result<(), EndermiteError> {
        let content = render_tag(members)?;
        self.write(relative_path, &content)
    }

    fn finalize(self, description: &str) -> Result<PackHandle, EndermiteError>
    where
        Self: Sized;
}

#[derive(Serialize)]
struct TagFile<'a> {
    values: &'a [String],
}

#[derive(Serialize)]
struct PackMetadata<'a> {
    pack: PackSection<'a>,
}

#[derive(Serialize)]
struct PackSection<'a> {
    pack_format: u32,
    description: &'a str,
}

pub fn render_tag(members: &[String]) -> Result<String, EndermiteError> {
    serde_json::to_string_pretty(&TagFile { values: members }).map_err(|source| {
        EndermiteError::Json {
            path: PathBuf::from("<tag>"),
            source,
        }
    })
}

pub fn render_pack_metadata(description: &str) -> Result<String, EndermiteError> {
    serde_json::to_string_pretty(&PackMetadata {
        pack: PackSection {
            pack_format: PACK_FORMAT,
            description,
        },
    })
    .map_err(|source| EndermiteError::Json {
        path: PathBuf::from(PACK_METADATA_FILE),
        source,
    })
}

#[derive(Debug, Default)]
pub struct MemoryPackWriter {
    files: BTreeMap<String, String>,
}

impl MemoryPackWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PackWriter for MemoryPackWriter {
    fn write(&mut self, relative_path: &str, content: &str) -> Result<(), EndermiteError> {
        self.files
            .insert(relative_path.to_string(), content.to_string());
        Ok(())
    }

    fn finalize(mut self, description: &str) -> Result<PackHandle, EndermiteError> {
        let metadata = render_pack_metadata(description)?;
        self.files.insert(PACK_METADATA_FILE.to_string(), metadata);
        Ok(PackHandle::Memory { files: self.files })
    }
}

/// Writes a pack under `root`. An existing pack is only removed, and only
/// when overwriting is allowed, once the first file is about to be written.
#[derive(Debug)]
pub struct DirectoryPackWriter {
    root: PathBuf,
    overwrite: bool,
    prepared: bool,
    files: usize,
}

impl DirectoryPackWriter {
    pub fn new(root: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            root: root.into(),
            overwrite,
            prepared: false,
            files: 0,
        }
    }

    fn prepare(&mut self) -> Result<(), EndermiteError> {
        if self.prepared {
            return Ok(());
        }
        if self.root.exists() {
            if !self.overwrite {
                return Err(EndermiteError::PackExists {
                    path: self.root.clone(),
                });
            }
            debug!(path = %self.root.display(), "removing previous pack");
            let removed = if self.root.is_dir() {
                fs::remove_dir_all(&self.root)
            } else {
                fs::remove_file(&self.root)
            };
            removed.map_err(|source| EndermiteError::io(&self.root, source))?;
        }
        fs::create_dir_all(&self.root).map_err(|source| EndermiteError::io(&self.root, source))?;
        self.prepared = true;
        Ok(())
    }
}

impl PackWriter for DirectoryPackWriter {
    fn write(&mut self, relative_path: &str, content: &str) -> Result<(), EndermiteError> {
        self.prepare()?;
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| EndermiteError::io(parent, source))?;
        }
        fs::write(&path, content).map_err(|source| EndermiteError::io(&path, source))?;
        self.files += 1;
        Ok(())
    }

    fn finalize(mut self, description: &str) -> Result<PackHandle, EndermiteError> {
        let metadata = render_pack_metadata(description)?;
        self.write(PACK_METADATA_FILE, &metadata)?;
        Ok(PackHandle::Directory {
            path: self.root,
            files: self.files,
        })
    }
}
