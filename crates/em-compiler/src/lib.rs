mod component;
mod context;
mod definition;
mod dispatch;
mod execution;
mod function;
mod guard;
mod names;
mod project;
mod registry;
mod scope;
mod tree;

pub use component::{resolve_methods, ResolvedMethod};
pub use context::BuildContext;
pub use definition::{ComponentDefinition, MethodBody, MethodDefinition, ResourceDefinition};
pub use dispatch::{ComponentDispatch, DispatchEntry, DispatchTable};
pub use execution::ExecutionStack;
pub use function::FunctionBuilder;
pub use guard::with_context;
pub use names::NameGenerator;
pub use project::{
    BuildOutput, ProjectBuilder, ProjectDefinition, DEFAULT_AUTHOR, DEFAULT_DESCRIPTION,
    DEFAULT_VERSION,
};
pub use registry::{KindTable, ResourceRegistry, ResourceTable};
pub use scope::{Commands, Execute, Scope};
pub use tree::{ActiveNodes, BuildNode, BuildTree, NodeId, NodeKind, NodePayload};
