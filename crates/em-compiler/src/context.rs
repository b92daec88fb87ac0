use em_core::naming::{generated_function_template, generated_tag_template};
use em_core::{Command, CompileError, ExecutionContext};

use crate::dispatch::DispatchTable;
use crate::execution::ExecutionStack;
use crate::names::NameGenerator;
use crate::tree::{ActiveNodes, BuildTree, NodeId, NodeKind};

/// State shared by every node of one build. Created per build, never reused.
#[derive(Debug)]
pub struct BuildContext {
    namespace: String,
    tree: BuildTree,
    execution: ExecutionStack,
    active: ActiveNodes,
    function_names: NameGenerator,
    tag_names: NameGenerator,
    dispatch: DispatchTable,
}

impl BuildContext {
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            function_names: NameGenerator::new(generated_function_template(&namespace)),
            tag_names: NameGenerator::new(generated_tag_template(&namespace)),
            namespace,
            tree: BuildTree::new(),
            execution: ExecutionStack::new(),
            active: ActiveNodes::default(),
            dispatch: DispatchTable::default(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn tree(&self) -> &BuildTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut BuildTree {
        &mut self.tree
    }

    pub fn execution(&self) -> &ExecutionStack {
        &self.execution
    }

    pub fn active(&self) -> &ActiveNodes {
        &self.active
    }

    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }

    pub(crate) fn set_dispatch(&mut self, dispatch: DispatchTable) {
        self.dispatch = dispatch;
    }

    pub fn next_function_name(&mut self) -> String {
        self.function_names.next_name()
    }

    pub fn next_tag_name(&mut self) -> String {
        self.tag_names.next_name()
    }

    pub fn current_function(&self) -> Result<NodeId, CompileError> {
        self.active.get(NodeKind::Function).ok_or_else(|| {
            CompileError::new(
                "NO_ACTIVE_FUNCTION",
                "Commands can only be emitted while a function is being built.",
            )
        })
    }

    /// Runs `f` with `id` as the active node of `kind`, restoring the previous one afterwards.
    pub fn with_active<T>(
        &mut self,
        kind: NodeKind,
        id: NodeId,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let previous = self.active.replace(kind, Some(id));
        let result = f(self);
        self.active.replace(kind, previous);
        result
    }

    pub fn with_execution<T>(
        &mut self,
        context: ExecutionContext,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.execution.push(context);
        let result = f(self);
        self.execution.pop();
        result
    }

    pub fn emit(
        &mut self,
        context: &ExecutionContext,
        command: Command,
    ) -> Result<(), CompileError> {
        let function = self.current_function()?;
        self.tree.function_mut(function)?.register_command(context, command)
    }
}

#[cfg(test)]
mod context_tests {
    use super::*;
    use crate::function::FunctionBuilder;
    use crate::tree::NodePayload;
    use em_core::Clause;

    #[test]
    fn generated_names_use_namespace_templates() {
        let mut ctx = BuildContext::new("demo");
        assert_eq!(ctx.next_function_name(), "demo:generated/00000000");
        assert_eq!(ctx.next_function_name(), "demo:generated/00000001");
        assert_eq!(ctx.next_tag_name(), "demo.generated.00000000");
    }

    #[test]
    fn emit_requires_an_active_function() {
        let mut ctx = BuildContext::new("demo");
        let error = ctx
            .emit(&ExecutionContext::empty(), Command::new(["say", "hi"]))
            .expect_err("no function");
        assert_eq!(error.code(), "NO_ACTIVE_FUNCTION");
    }

    #[test]
    fn scoped_helpers_restore_previous_state() {
        let mut ctx = BuildContext::new("demo");
        let function = ctx.tree_mut().insert(
            None,
            "demo:f",
            NodePayload::Function(FunctionBuilder::named("demo:f", ExecutionContext::empty())),
        );
        let context = ExecutionContext::empty().enter([Clause::new(["as", "@a"])]);

        ctx.with_active(NodeKind::Function, function, |ctx| {
            ctx.with_execution(context.clone(), |ctx| {
                assert_eq!(ctx.execution().current(), context);
                let current = ctx.execution().current();
                ctx.emit(&current, Command::new(["say", "hi"]))
                    .expect("emit");
            });
            assert!(ctx.execution().current().is_empty());
        });

        assert_eq!(ctx.active().get(NodeKind::Function), None);
        let commands = ctx.tree().function(function).expect("function").commands();
        assert_eq!(commands[0].to_string(), "execute as @a run say hi");
    }
}
