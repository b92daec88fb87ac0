use std::fmt;

use serde::{Deserialize, Serialize};

use crate::naming::{function_file_path, tag_file_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleHook {
    Init,
    Destroy,
    Tick,
    Load,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 4] = [
        LifecycleHook::Init,
        LifecycleHook::Destroy,
        LifecycleHook::Tick,
        LifecycleHook::Load,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Destroy => "destroy",
            Self::Tick => "tick",
            Self::Load => "load",
        }
    }

    /// Runtime-wide tag the hook is dispatched from, for hooks that are not
    /// driven by attach/detach.
    pub fn runtime_tag(self) -> Option<&'static str> {
        match self {
            Self::Tick => Some("minecraft:tick"),
            Self::Load => Some("minecraft:load"),
            Self::Init | Self::Destroy => None,
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Component,
    Method,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component => f.write_str("component"),
            Self::Method => f.write_str("component method"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionArtifact {
    pub location: String,
    pub commands: Vec<String>,
}

impl FunctionArtifact {
    pub fn relative_path(&self) -> String {
        function_file_path(&self.location)
    }

    pub fn content(&self) -> String {
        let mut content = self.commands.join("\n");
        content.push('\n');
        content
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagArtifact {
    pub location: String,
    pub members: Vec<String>,
}

impl TagArtifact {
    pub fn relative_path(&self) -> String {
        tag_file_path(&self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Artifact {
    Function(FunctionArtifact),
    Tag(TagArtifact),
}

impl Artifact {
    pub fn location(&self) -> &str {
        match self {
            Self::Function(function) => &function.location,
            Self::Tag(tag) => &tag.location,
        }
    }

    pub fn relative_path(&self) -> String {
        match self {
            Self::Function(function) => function.relative_path(),
            Self::Tag(tag) => tag.relative_path(),
        }
    }
}
