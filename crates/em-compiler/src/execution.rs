use em_core::{Clause, ExecutionContext};

#[derive(Debug, Default)]
pub struct ExecutionStack {
    frames: Vec<ExecutionContext>,
}

impl ExecutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ExecutionContext {
        self.frames.last().cloned().unwrap_or_default()
    }

    /// Context for `clauses` nested under the current one. Nothing is installed.
    pub fn enter<I>(&self, clauses: I) -> ExecutionContext
    where
        I: IntoIterator<Item = Clause>,
    {
        self.current().enter(clauses)
    }

    pub(crate) fn push(&mut self, context: ExecutionContext) {
        self.frames.push(context);
    }

    pub(crate) fn pop(&mut self) -> Option<ExecutionContext> {
        self.frames.pop()
    }
}
