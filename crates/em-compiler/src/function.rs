use em_core::{BodyError, Command, CompileError, ExecutionContext, FunctionArtifact};
use tracing::trace;

use crate::context::BuildContext;
use crate::scope::Scope;
use crate::tree::{NodeId, NodeKind, NodePayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionState {
    Open,
    Closed,
    Discarded,
}

#[derive(Debug)]
pub struct FunctionBuilder {
    location: Option<String>,
    base: ExecutionContext,
    commands: Vec<Command>,
    sources: Vec<(ExecutionContext, Command)>,
    state: FunctionState,
}

impl FunctionBuilder {
    pub fn named(location: impl Into<String>, base: ExecutionContext) -> Self {
        Self {
            location: Some(location.into()),
            base,
            commands: Vec::new(),
            sources: Vec::new(),
            state: FunctionState::Open,
        }
    }

    pub fn anonymous(base: ExecutionContext) -> Self {
        Self {
            location: None,
            base,
            commands: Vec::new(),
            sources: Vec::new(),
            state: FunctionState::Open,
        }
    }

    pub fn label(&self) -> &str {
        self.location.as_deref().unwrap_or("<anonymous>")
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_open(&self) -> bool {
        self.state == FunctionState::Open
    }

    /// Appends `command` wrapped in whatever part of `current` is not already
    /// active in the function's own base context.
    pub fn register_command(
        &mut self,
        current: &ExecutionContext,
        command: Command,
    ) -> Result<(), CompileError> {
        if !self.is_open() {
            return Err(CompileError::ClosedBuilder {
                artifact: self.label().to_string(),
            });
        }
        let prefix = current.prefix_for(&self.base)?;
        self.commands.push(command.prefixed(&prefix));
        self.sources.push((current.clone(), command));
        Ok(())
    }

    pub fn build(&mut self) -> Result<(), CompileError> {
        if !self.is_open() {
            return Err(CompileError::ClosedBuilder {
                artifact: self.label().to_string(),
            });
        }
        self.state = FunctionState::Closed;
        Ok(())
    }

    /// Unwrapped commands with the full context each was registered under.
    pub(crate) fn take_sources(&mut self) -> Vec<(ExecutionContext, Command)> {
        std::mem::take(&mut self.sources)
    }

    pub fn discard(&mut self) {
        self.state = FunctionState::Discarded;
    }

    pub(crate) fn assign_location(&mut self, location: String) {
        self.location = Some(location);
    }

    pub fn to_artifact(&self) -> Option<FunctionArtifact> {
        if self.state != FunctionState::Closed {
            return None;
        }
        Some(FunctionArtifact {
            location: self.location.clone()?,
            commands: self.commands.iter().map(ToString::to_string).collect(),
        })
    }
}

/// Runs `body` under `context`. When `context` adds clauses to the current
/// one, commands are collected in a child function: none are dropped, a single
/// one is inlined in the parent, more are moved to a generated function that
/// the parent calls once.
pub(crate) fn run_scoped<F>(
    ctx: &mut BuildContext,
    context: ExecutionContext,
    body: F,
) -> Result<(), BodyError>
where
    F: FnOnce(&mut Scope<'_>) -> Result<(), BodyError>,
{
    if context == ctx.execution().current() {
        return body(&mut Scope::new(ctx));
    }

    let parent = ctx.current_function()?;
    let child = ctx.tree_mut().insert(
        Some(parent),
        "scope",
        NodePayload::Function(FunctionBuilder::anonymous(context.clone())),
    );

    let outcome = ctx.with_active(NodeKind::Function, child, |ctx| {
        ctx.with_execution(context.clone(), |ctx| body(&mut Scope::new(ctx)))
    });
    if let Err(error) = outcome {
        ctx.tree_mut().function_mut(child)?.discard();
        return Err(error);
    }

    let function = ctx.tree_mut().function_mut(child)?;
    function.build()?;
    let count = function.commands().len();

    match count {
        0 => {
            function.discard();
            ctx.tree_mut().dissolve(child);
            trace!("dropped empty scoped block");
        }
        1 => {
            function.discard();
            let mut sources = function.take_sources();
            ctx.tree_mut().dissolve(child);
            if let Some((registered, command)) = sources.pop() {
                ctx.emit(&registered, command)?;
            }
        }
        _ => {
            let location = ctx.next_function_name();
            trace!(%location, commands = count, "scoped block moved to generated function");
            ctx.tree_mut()
                .function_mut(child)?
                .assign_location(location.clone());
            ctx.tree_mut().node_mut(child).name = location.clone();
            ctx.emit(&context, Command::new(["function".to_string(), location]))?;
        }
    }

    Ok(())
}

/// Builds a named top-level function under `parent`. The body starts from an
/// empty execution context; a failing body leaves the function discarded.
pub(crate) fn build_function<F>(
    ctx: &mut BuildContext,
    parent: NodeId,
    location: &str,
    body: F,
) -> Result<NodeId, BodyError>
where
    F: FnOnce(&mut Scope<'_>) -> Result<(), BodyError>,
{
    let node = ctx.tree_mut().insert(
        Some(parent),
        location,
        NodePayload::Function(FunctionBuilder::named(location, ExecutionContext::empty())),
    );

    let outcome = ctx.with_active(NodeKind::Function, node, |ctx| {
        ctx.with_execution(ExecutionContext::empty(), |ctx| body(&mut Scope::new(ctx)))
    });
    let function = ctx.tree_mut().function_mut(node)?;
    if let Err(error) = outcome {
        function.discard();
        return Err(error);
    }
    function.build()?;
    trace!(%location, commands = function.commands().len(), "function built");
    Ok(node)
}
