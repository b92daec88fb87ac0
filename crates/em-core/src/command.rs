use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Command(Vec<String>);

impl Command {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn prefixed(&self, prefix: &[String]) -> Self {
        let mut tokens = Vec::with_capacity(prefix.len() + self.0.len());
        tokens.extend_from_slice(prefix);
        tokens.extend_from_slice(&self.0);
        Self(tokens)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|token| token.replace('\n', " ").trim().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&rendered)
    }
}

/// One scoping clause of an `execute` chain, e.g. `as @e[tag=x]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clause(Vec<String>);

impl Clause {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ExecutionContext {
    clauses: Vec<Clause>,
}

impl ExecutionContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn enter<I>(&self, clauses: I) -> Self
    where
        I: IntoIterator<Item = Clause>,
    {
        let mut extended = self.clauses.clone();
        extended.extend(clauses.into_iter().filter(|clause| !clause.is_empty()));
        Self { clauses: extended }
    }

    pub fn extends(&self, base: &ExecutionContext) -> bool {
        self.clauses.starts_with(&base.clauses)
    }

    /// Clauses active here but not in `base`, if `self` is an extension of it.
    pub fn delta_from<'a>(&'a self, base: &ExecutionContext) -> Option<&'a [Clause]> {
        if self.extends(base) {
            Some(&self.clauses[base.clauses.len()..])
        } else {
            None
        }
    }

    pub fn prefix_for(&self, base: &ExecutionContext) -> Result<Vec<String>, CompileError> {
        let delta = self.delta_from(base).ok_or_else(|| {
            CompileError::new(
                "EXECUTION_CONTEXT_DETACHED",
                format!(
                    "Execution context [{}] does not extend the enclosing context [{}].",
                    describe(&self.clauses),
                    describe(&base.clauses)
                ),
            )
        })?;
        Ok(wrap_clauses(delta))
    }
}

pub fn wrap_clauses(clauses: &[Clause]) -> Vec<String> {
    if clauses.is_empty() {
        return Vec::new();
    }

    let mut tokens = vec!["execute".to_string()];
    for clause in clauses {
        tokens.extend(clause.tokens().iter().cloned());
    }
    tokens.push("run".to_string());
    tokens
}

fn describe(clauses: &[Clause]) -> String {
    clauses
        .iter()
        .map(|clause| clause.tokens().join(" "))
        .collect::<Vec<_>>()
        .join(", ")
}
