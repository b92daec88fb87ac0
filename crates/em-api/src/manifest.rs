use std::collections::BTreeSet;
use std::sync::Arc;

use em_compiler::{Commands, ComponentDefinition, MethodDefinition, ProjectDefinition, Scope};
use em_core::naming::qualify;
use em_core::{BodyError, Clause, LifecycleHook, Visibility};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl ProjectManifest {
    pub fn to_definition(&self) -> ProjectDefinition {
        let mut project = ProjectDefinition::new(&self.name, &self.namespace);
        if let Some(description) = &self.description {
            project = project.with_description(description);
        }
        if let Some(author) = &self.author {
            project = project.with_author(author);
        }
        if let Some(version) = &self.version {
            project = project.with_version(version);
        }
        project
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub methods: Vec<MethodManifest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodManifest {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub hooks: BTreeSet<LifecycleHook>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub guarded: bool,
    #[serde(default)]
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Statement {
    Run { tokens: Vec<String> },
    Say { message: String },
    Log { message: String },
    Error { message: String },
    AddTag { tag: String },
    RemoveTag { tag: String },
    Function { location: String },
    FunctionTag { location: String },
    Invoke { method: String },
    Call { component: String, method: String },
    Attach { component: String },
    Detach { component: String },
    Execute {
        clauses: Vec<Vec<String>>,
        #[serde(default)]
        body: Vec<Statement>,
    },
}

impl ComponentManifest {
    pub fn to_definition(&self, namespace: &str, fallback_name: &str) -> ComponentDefinition {
        let name = self.name.as_deref().unwrap_or(fallback_name);
        let mut component = ComponentDefinition::new(namespace, name);
        if let Some(base) = &self.base {
            component = component.inherits(base);
        }
        if self.is_abstract {
            component = component.abstract_component();
        }
        for method in &self.methods {
            component = component.method(method.to_definition());
        }
        component
    }
}

impl MethodManifest {
    pub fn to_definition(&self) -> MethodDefinition {
        let body = Arc::new(self.body.clone());
        let mut method = MethodDefinition::new(&self.name, self.visibility, move |scope| {
            run_statements(scope, &body)
        });
        for hook in &self.hooks {
            method = method.hook(*hook);
        }
        for tag in &self.tags {
            method = method.tag(tag);
        }
        if self.guarded {
            method = method.guarded();
        }
        method
    }
}

pub fn run_statements(scope: &mut Scope<'_>, statements: &[Statement]) -> Result<(), BodyError> {
    for statement in statements {
        match statement {
            Statement::Run { tokens } => scope.run(tokens.iter().cloned())?,
            Statement::Say { message } => scope.say(message)?,
            Statement::Log { message } => scope.log(message)?,
            Statement::Error { message } => scope.error(message)?,
            Statement::AddTag { tag } => scope.add_tag(tag)?,
            Statement::RemoveTag { tag } => scope.remove_tag(tag)?,
            Statement::Function { location } => {
                let location = qualify(scope.namespace(), location);
                scope.function(&location)?;
            }
            Statement::FunctionTag { location } => {
                let location = qualify(scope.namespace(), location);
                scope.function_tag(&location)?;
            }
            Statement::Invoke { method } => scope.invoke(method)?,
            Statement::Call { component, method } => scope.call(component, method)?,
            Statement::Attach { component } => scope.attach(component)?,
            Statement::Detach { component } => scope.detach(component)?,
            Statement::Execute { clauses, body } => {
                let clauses = clauses.iter().map(|tokens| Clause::new(tokens.iter().cloned()));
                scope
                    .execute(clauses)
                    .block(|scope| run_statements(scope, body))?;
            }
        }
    }
    Ok(())
}
