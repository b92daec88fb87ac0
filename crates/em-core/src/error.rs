use std::error::Error as StdError;

use thiserror::Error;

use crate::types::ResourceKind;

pub type BodyError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{kind} \"{name}\" already exists in namespace \"{namespace}\"")]
    DuplicateResource {
        namespace: String,
        kind: ResourceKind,
        name: String,
    },
    #[error("component \"{component}\" is abstract and cannot be attached or detached")]
    AbstractComponent { component: String },
    #[error("function \"{artifact}\" is no longer open for commands")]
    ClosedBuilder { artifact: String },
    #[error("{code}: {message}")]
    Invalid { code: String, message: String },
    #[error("{label}")]
    Build {
        label: String,
        #[source]
        source: BodyError,
    },
}

impl CompileError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn build(label: impl Into<String>, source: impl Into<BodyError>) -> Self {
        Self::Build {
            label: label.into(),
            source: source.into(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::DuplicateResource { .. } => "RESOURCE_DUPLICATE",
            Self::AbstractComponent { .. } => "COMPONENT_ABSTRACT",
            Self::ClosedBuilder { .. } => "BUILDER_CLOSED",
            Self::Invalid { code, .. } => code,
            Self::Build { .. } => "BUILD_FAILED",
        }
    }

    /// Labels of every nested build step, outermost first.
    pub fn label_chain(&self) -> Vec<&str> {
        let mut labels = Vec::new();
        let mut current: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(error) = current {
            if let Some(CompileError::Build { label, .. }) = error.downcast_ref::<CompileError>() {
                labels.push(label.as_str());
            }
            current = error.source();
        }
        labels
    }

    /// The error raised below the innermost build label.
    pub fn innermost_cause(&self) -> Option<&(dyn StdError + 'static)> {
        let mut cause = None;
        let mut current: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(error) = current {
            if let Some(CompileError::Build { source, .. }) = error.downcast_ref::<CompileError>() {
                cause = Some(source.as_ref() as &(dyn StdError + 'static));
            }
            current = error.source();
        }
        cause
    }

    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(source) = current.source() {
            current = source;
        }
        current
    }
}
