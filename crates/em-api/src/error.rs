use std::path::PathBuf;

use em_core::CompileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EndermiteError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },
    #[error("Project directory does not exist: {path}")]
    ProjectNotFound { path: PathBuf },
    #[error("Pack already exists at {path}; pass --overwrite to replace it.")]
    PackExists { path: PathBuf },
}

impl EndermiteError {
    pub fn code(&self) -> &str {
        match self {
            Self::Compile(error) => error.code(),
            Self::Io { .. } => "IO_ERROR",
            Self::Json { .. } => "JSON_INVALID",
            Self::Manifest { .. } => "MANIFEST_INVALID",
            Self::ProjectNotFound { .. } => "PROJECT_NOT_FOUND",
            Self::PackExists { .. } => "PACK_EXISTS",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }
}
