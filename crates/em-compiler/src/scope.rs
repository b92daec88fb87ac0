use std::fmt::Display;

use em_core::naming::{attach_function, detach_function, underscore};
use em_core::{BodyError, Clause, Command, CompileError, ExecutionContext};

use crate::context::BuildContext;
use crate::function::run_scoped;
use crate::tree::NodeKind;

/// Command helpers shared by every emission handle.
pub trait Commands {
    fn run_command(&mut self, command: Command) -> Result<(), CompileError>;

    fn run<I, T>(&mut self, tokens: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.run_command(Command::new(tokens))
    }

    fn say(&mut self, message: impl Display) -> Result<(), CompileError> {
        self.run(["say".to_string(), message.to_string()])
    }

    fn log_with(
        &mut self,
        message: impl Display,
        color: &str,
        prefix: &str,
    ) -> Result<(), CompileError> {
        let payload = serde_json::json!({
            "text": format!("{} {}", prefix, message),
            "color": color,
        });
        self.run(["tellraw".to_string(), "@a".to_string(), payload.to_string()])
    }

    fn log(&mut self, message: impl Display) -> Result<(), CompileError> {
        self.log_with(message, "gray", "[LOG]")
    }

    fn error(&mut self, message: impl Display) -> Result<(), CompileError> {
        self.log_with(message, "red", "[ERR]")
    }

    fn add_tag(&mut self, tag: &str) -> Result<(), CompileError> {
        self.run(["tag", "@s", "add", tag])
    }

    fn remove_tag(&mut self, tag: &str) -> Result<(), CompileError> {
        self.run(["tag", "@s", "remove", tag])
    }

    fn function(&mut self, location: &str) -> Result<(), CompileError> {
        self.run(["function", location])
    }

    fn function_tag(&mut self, location: &str) -> Result<(), CompileError> {
        self.run(["function".to_string(), format!("#{}", location)])
    }
}

/// Handle passed to method bodies. Commands land in the function currently
/// being built, under the current execution context.
pub struct Scope<'c> {
    ctx: &'c mut BuildContext,
}

impl<'c> Scope<'c> {
    pub(crate) fn new(ctx: &'c mut BuildContext) -> Self {
        Self { ctx }
    }

    pub fn namespace(&self) -> &str {
        self.ctx.namespace()
    }

    pub fn execute<I>(&mut self, clauses: I) -> Execute<'_, 'c>
    where
        I: IntoIterator<Item = Clause>,
    {
        let context = self.ctx.execution().enter(clauses);
        Execute {
            scope: self,
            context,
        }
    }

    pub fn fresh_tag(&mut self) -> String {
        self.ctx.next_tag_name()
    }

    pub fn current_component(&self) -> Option<String> {
        let function = self.ctx.active().get(NodeKind::Function)?;
        let node = self.ctx.tree().ancestor(function, NodeKind::Component)?;
        Some(self.ctx.tree().node(node).name.clone())
    }

    /// Calls `method` on the component being built.
    pub fn invoke(&mut self, method: &str) -> Result<(), CompileError> {
        let component = self.current_component().ok_or_else(|| {
            CompileError::new(
                "NO_ACTIVE_COMPONENT",
                format!("Cannot invoke \"{}\" outside of a component.", method),
            )
        })?;
        self.call(&component, method)
    }

    pub fn call(&mut self, component: &str, method: &str) -> Result<(), CompileError> {
        let caller = self.current_component();
        let location = self
            .ctx
            .dispatch()
            .resolve(caller.as_deref(), &underscore(component), method)?
            .location
            .clone();
        self.function(&location)
    }

    pub fn attach(&mut self, component: &str) -> Result<(), CompileError> {
        let name = self.instantiable(component)?;
        let location = attach_function(self.namespace(), &name);
        self.function(&location)
    }

    pub fn detach(&mut self, component: &str) -> Result<(), CompileError> {
        let name = self.instantiable(component)?;
        let location = detach_function(self.namespace(), &name);
        self.function(&location)
    }

    fn instantiable(&self, component: &str) -> Result<String, CompileError> {
        let name = underscore(component);
        let dispatch = self.ctx.dispatch().component(&name).ok_or_else(|| {
            CompileError::new(
                "COMPONENT_NOT_FOUND",
                format!("Component \"{}\" is not declared.", name),
            )
        })?;
        if dispatch.is_abstract {
            return Err(CompileError::AbstractComponent { component: name });
        }
        Ok(name)
    }
}

impl Commands for Scope<'_> {
    fn run_command(&mut self, command: Command) -> Result<(), CompileError> {
        let current = self.ctx.execution().current();
        self.ctx.emit(&current, command)
    }
}

/// A pending `execute` chain: single commands run inline under it, `block`
/// opens a nested scope.
pub struct Execute<'s, 'c> {
    scope: &'s mut Scope<'c>,
    context: ExecutionContext,
}

impl Execute<'_, '_> {
    pub fn block<F>(self, body: F) -> Result<(), BodyError>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<(), BodyError>,
    {
        run_scoped(self.scope.ctx, self.context, body)
    }
}

impl Commands for Execute<'_, '_> {
    fn run_command(&mut self, command: Command) -> Result<(), CompileError> {
        self.scope.ctx.emit(&self.context, command)
    }
}
