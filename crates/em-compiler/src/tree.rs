use std::sync::Arc;

use em_core::CompileError;

use crate::component::ResolvedMethod;
use crate::definition::ComponentDefinition;
use crate::function::FunctionBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Project,
    Component,
    Method,
    Function,
    Tag,
}

#[derive(Debug)]
pub enum NodePayload {
    Project { description: String },
    Component { component: Arc<ComponentDefinition> },
    Method { method: Box<ResolvedMethod> },
    Function(FunctionBuilder),
    Tag { location: String, members: Vec<String> },
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Project { .. } => NodeKind::Project,
            Self::Component { .. } => NodeKind::Component,
            Self::Method { .. } => NodeKind::Method,
            Self::Function(_) => NodeKind::Function,
            Self::Tag { .. } => NodeKind::Tag,
        }
    }
}

#[derive(Debug)]
pub struct BuildNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub payload: NodePayload,
}

impl BuildNode {
    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }
}

#[derive(Debug, Default)]
pub struct BuildTree {
    nodes: Vec<BuildNode>,
}

impl BuildTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        payload: NodePayload,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(BuildNode {
            name: name.into(),
            parent,
            children: Vec::new(),
            payload,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &BuildNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut BuildNode {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Nearest node of `kind` walking up from `id`, `id` included.
    pub fn ancestor(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if node.kind() == kind {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    pub fn function(&self, id: NodeId) -> Result<&FunctionBuilder, CompileError> {
        match &self.node(id).payload {
            NodePayload::Function(function) => Ok(function),
            other => Err(not_a_function(id, other.kind())),
        }
    }

    pub fn function_mut(&mut self, id: NodeId) -> Result<&mut FunctionBuilder, CompileError> {
        match &mut self.node_mut(id).payload {
            NodePayload::Function(function) => Ok(function),
            other => Err(not_a_function(id, other.kind())),
        }
    }

    /// Removes `id` from its parent, handing its children over in its place.
    pub fn dissolve(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        if let Some(position) = siblings.iter().position(|sibling| *sibling == id) {
            siblings.splice(position..=position, children);
        }
    }

    pub fn preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }
}

fn not_a_function(id: NodeId, kind: NodeKind) -> CompileError {
    CompileError::new(
        "BUILD_NODE_KIND",
        format!("Build node {} is a {:?}, not a function.", id.0, kind),
    )
}

/// Currently active node per kind while the walk is inside it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActiveNodes {
    project: Option<NodeId>,
    component: Option<NodeId>,
    method: Option<NodeId>,
    function: Option<NodeId>,
}

impl ActiveNodes {
    pub fn get(&self, kind: NodeKind) -> Option<NodeId> {
        match kind {
            NodeKind::Project => self.project,
            NodeKind::Component => self.component,
            NodeKind::Method => self.method,
            NodeKind::Function => self.function,
            NodeKind::Tag => None,
        }
    }

    pub fn replace(&mut self, kind: NodeKind, id: Option<NodeId>) -> Option<NodeId> {
        let slot = match kind {
            NodeKind::Project => &mut self.project,
            NodeKind::Component => &mut self.component,
            NodeKind::Method => &mut self.method,
            NodeKind::Function => &mut self.function,
            NodeKind::Tag => return None,
        };
        std::mem::replace(slot, id)
    }
}
