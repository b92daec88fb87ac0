use std::collections::BTreeMap;
use std::sync::Arc;

use em_core::naming::is_valid_namespace;
use em_core::{Artifact, CompileError, FunctionArtifact, TagArtifact};
use tracing::{debug, info};

use crate::component::{build_component, resolve_methods, ResolvedMethod};
use crate::context::BuildContext;
use crate::definition::ComponentDefinition;
use crate::dispatch::DispatchTable;
use crate::guard::with_context;
use crate::registry::ResourceRegistry;
use crate::tree::{NodeId, NodeKind, NodePayload};

pub const DEFAULT_DESCRIPTION: &str = "An endermite project";
pub const DEFAULT_AUTHOR: &str = "N/A";
pub const DEFAULT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDefinition {
    pub name: String,
    pub namespace: String,
    pub description: String,
    pub author: String,
    pub version: String,
}

impl ProjectDefinition {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn pack_description(&self) -> String {
        format!(
            "{}\n\nVersion {}\nBy {}",
            self.description, self.version, self.author
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub name: String,
    pub namespace: String,
    pub description: String,
    pub functions: Vec<FunctionArtifact>,
    pub tags: Vec<TagArtifact>,
}

impl BuildOutput {
    pub fn function(&self, location: &str) -> Option<&FunctionArtifact> {
        self.functions
            .iter()
            .find(|function| function.location == location)
    }

    pub fn tag(&self, location: &str) -> Option<&TagArtifact> {
        self.tags.iter().find(|tag| tag.location == location)
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.functions
            .iter()
            .cloned()
            .map(Artifact::Function)
            .chain(self.tags.iter().cloned().map(Artifact::Tag))
            .collect()
    }
}

pub struct ProjectBuilder<'a> {
    project: &'a ProjectDefinition,
    registry: &'a ResourceRegistry,
}

impl<'a> ProjectBuilder<'a> {
    pub fn new(project: &'a ProjectDefinition, registry: &'a ResourceRegistry) -> Self {
        Self { project, registry }
    }

    /// Compiles every component registered under the project namespace.
    /// Nothing is returned unless the whole project builds.
    pub fn build(&self) -> Result<BuildOutput, CompileError> {
        with_context(format!("project \"{}\"", self.project.name), || {
            self.build_project()
        })
    }

    fn build_project(&self) -> Result<BuildOutput, CompileError> {
        let namespace = self.project.namespace.as_str();
        if !is_valid_namespace(namespace) {
            return Err(CompileError::new(
                "NAMESPACE_INVALID",
                format!("Invalid namespace \"{}\".", namespace),
            ));
        }

        let components = self.resolve_components()?;
        debug!(namespace, components = components.len(), "resolved components");

        let mut ctx = BuildContext::new(namespace);
        let mut dispatch = DispatchTable::default();
        for (component, methods) in &components {
            dispatch.insert_component(&component.name, component.is_abstract, methods);
        }
        ctx.set_dispatch(dispatch);

        let root = ctx.tree_mut().insert(
            None,
            self.project.name.clone(),
            NodePayload::Project {
                description: self.project.pack_description(),
            },
        );
        ctx.with_active(NodeKind::Project, root, |ctx| {
            for (component, methods) in &components {
                build_component(ctx, root, component, methods)?;
            }
            Ok::<(), CompileError>(())
        })?;

        let output = self.collect_output(&ctx, root);
        info!(
            project = %self.project.name,
            functions = output.functions.len(),
            tags = output.tags.len(),
            "built project"
        );
        Ok(output)
    }

    fn resolve_components(
        &self,
    ) -> Result<Vec<(Arc<ComponentDefinition>, Vec<ResolvedMethod>)>, CompileError> {
        self.registry
            .components(&self.project.namespace)
            .into_iter()
            .map(|component| {
                let methods = with_context(format!("component \"{}\"", component.name), || {
                    resolve_methods(&component, self.registry)
                })?;
                Ok::<_, CompileError>((component, methods))
            })
            .collect()
    }

    fn collect_output(&self, ctx: &BuildContext, root: NodeId) -> BuildOutput {
        let mut functions = Vec::new();
        let mut tags: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut description = None;

        for id in ctx.tree().preorder(root) {
            match &ctx.tree().node(id).payload {
                NodePayload::Project { description: text } => {
                    description = Some(text.clone());
                }
                NodePayload::Function(function) => {
                    functions.extend(function.to_artifact());
                }
                NodePayload::Tag { location, members } => {
                    let entry = tags.entry(location.clone()).or_default();
                    for member in members {
                        if !entry.contains(member) {
                            entry.push(member.clone());
                        }
                    }
                }
                _ => {}
            }
        }

        BuildOutput {
            name: self.project.name.clone(),
            namespace: self.project.namespace.clone(),
            description: description.unwrap_or_else(|| self.project.pack_description()),
            functions,
            tags: tags
                .into_iter()
                .map(|(location, members)| TagArtifact { location, members })
                .collect(),
        }
    }
}

#[cfg(test)]
mod project_tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::definition::MethodDefinition;
    use crate::scope::{Commands, Scope};
    use em_core::Clause;
    use tracing_test::traced_test;

    fn build(components: Vec<ComponentDefinition>) -> Result<BuildOutput, CompileError> {
        let mut registry = ResourceRegistry::new();
        for component in components {
            registry.register_component(component).expect("register");
        }
        let project = ProjectDefinition::new("Demo", "demo");
        ProjectBuilder::new(&project, &registry).build()
    }

    fn commands<'a>(output: &'a BuildOutput, location: &str) -> &'a [String] {
        &output
            .function(location)
            .unwrap_or_else(|| panic!("missing function {}", location))
            .commands
    }

    fn members<'a>(output: &'a BuildOutput, location: &str) -> &'a [String] {
        &output
            .tag(location)
            .unwrap_or_else(|| panic!("missing tag {}", location))
            .members
    }

    #[derive(Default)]
    struct Entity {
        tags: BTreeSet<String>,
        said: Vec<String>,
    }

    fn run_function(output: &BuildOutput, location: &str, entity: &mut Entity) {
        for line in commands(output, location) {
            run_line(output, line, entity);
        }
    }

    fn run_line(output: &BuildOutput, line: &str, entity: &mut Entity) {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        match tokens.as_slice() {
            ["execute", condition, "entity", selector, "run", rest @ ..] => {
                let tag = selector
                    .trim_start_matches("@s[tag=")
                    .trim_end_matches(']');
                if (*condition == "if") == entity.tags.contains(tag) {
                    run_line(output, &rest.join(" "), entity);
                }
            }
            ["tag", "@s", "add", tag] => {
                entity.tags.insert(tag.to_string());
            }
            ["tag", "@s", "remove", tag] => {
                entity.tags.remove(*tag);
            }
            ["function", target] => match target.strip_prefix('#') {
                Some(tag) => {
                    for member in members(output, tag) {
                        run_function(output, member, entity);
                    }
                }
                None => run_function(output, target, entity),
            },
            ["say", message @ ..] => entity.said.push(message.join(" ")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    fn hello() -> ComponentDefinition {
        ComponentDefinition::new("demo", "Hello").method(
            MethodDefinition::public("say_hello", |scope: &mut Scope<'_>| {
                scope.say("hi")?;
                Ok(())
            })
            .tick(),
        )
    }

    #[test]
    fn tick_method_builds_function_callback_and_dispatcher() {
        let output = build(vec![hello()]).expect("build");

        assert_eq!(commands(&output, "demo:component/hello/say_hello"), ["say hi"]);
        assert_eq!(
            members(&output, "demo:component/callback/tick/hello"),
            ["demo:component/hello/say_hello"]
        );
        assert_eq!(members(&output, "minecraft:tick"), ["demo:generated/00000000"]);
        assert_eq!(
            commands(&output, "demo:generated/00000000"),
            [concat!(
                "execute as @e[tag=demo.component.hello] ",
                "run function #demo:component/callback/tick/hello"
            )]
        );
        assert_eq!(
            commands(&output, "demo:attach/hello"),
            [concat!(
                "execute unless entity @s[tag=demo.component.hello] ",
                "run tag @s add demo.component.hello"
            )]
        );
        assert_eq!(
            commands(&output, "demo:detach/hello"),
            [concat!(
                "execute if entity @s[tag=demo.component.hello] ",
                "run tag @s remove demo.component.hello"
            )]
        );
        assert!(output.tag("minecraft:load").is_none());
        assert_eq!(output.description, "An endermite project\n\nVersion 0.1.0\nBy N/A");
    }

    #[test]
    fn attach_and_detach_run_lifecycle_hooks_once() {
        let component = ComponentDefinition::new("demo", "Counter")
            .method(
                MethodDefinition::public("setup", |scope: &mut Scope<'_>| {
                    scope.say("init")?;
                    Ok(())
                })
                .init(),
            )
            .method(
                MethodDefinition::public("teardown", |scope: &mut Scope<'_>| {
                    scope.say("destroy")?;
                    Ok(())
                })
                .destroy(),
            );
        let output = build(vec![component]).expect("build");

        let mut entity = Entity::default();
        run_function(&output, "demo:attach/counter", &mut entity);
        run_function(&output, "demo:attach/counter", &mut entity);
        assert!(entity.tags.contains("demo.component.counter"));
        run_function(&output, "demo:detach/counter", &mut entity);
        run_function(&output, "demo:detach/counter", &mut entity);

        assert_eq!(entity.said, vec!["init", "destroy"]);
        assert!(entity.tags.is_empty());
    }

    #[test]
    fn scoped_blocks_are_inlined_or_moved_to_generated_functions() {
        let component = ComponentDefinition::new("demo", "blocks").method(MethodDefinition::public(
            "run",
            |scope: &mut Scope<'_>| {
                scope
                    .execute([Clause::new(["as", "@a"])])
                    .block(|scope| {
                        scope.say("a")?;
                        scope.execute([Clause::new(["at", "@s"])]).block(|scope| {
                            scope.say("b")?;
                            scope.say("c")?;
                            Ok(())
                        })
                    })?;
                scope
                    .execute([Clause::new(["as", "@p"])])
                    .block(|scope| Ok(scope.say("solo")?))?;
                scope.execute([Clause::new(["as", "@r"])]).block(|_| Ok(()))?;
                Ok(())
            },
        ));
        let output = build(vec![component]).expect("build");

        assert_eq!(
            commands(&output, "demo:component/blocks/run"),
            [
                "execute as @a run function demo:generated/00000001",
                "execute as @p run say solo",
            ]
        );
        assert_eq!(
            commands(&output, "demo:generated/00000001"),
            ["say a", "execute at @s run function demo:generated/00000000"]
        );
        assert_eq!(commands(&output, "demo:generated/00000000"), ["say b", "say c"]);
    }

    #[test]
    fn nested_single_command_blocks_merge_their_clauses() {
        let component = ComponentDefinition::new("demo", "nested").method(MethodDefinition::public(
            "run",
            |scope: &mut Scope<'_>| {
                scope.execute([Clause::new(["as", "@a"])]).block(|scope| {
                    scope
                        .execute([Clause::new(["at", "@s"])])
                        .block(|scope| Ok(scope.say("x")?))
                })?;
                scope
                    .execute([Clause::new(["as", "@a"])])
                    .block(|scope| Ok(scope.execute([Clause::new(["at", "@s"])]).say("y")?))?;
                Ok(())
            },
        ));
        let output = build(vec![component]).expect("build");

        assert_eq!(
            commands(&output, "demo:component/nested/run"),
            ["execute as @a at @s run say x", "execute as @a at @s run say y"]
        );
        assert!(output.function("demo:generated/00000000").is_none());
    }

    #[test]
    fn calls_resolve_through_the_dispatch_table() {
        let caller = ComponentDefinition::new("demo", "caller")
            .method(MethodDefinition::public("go", |scope: &mut Scope<'_>| {
                scope.call("Hello", "say_hello")?;
                scope.invoke("helper")?;
                scope.attach("hello")?;
                Ok(())
            }))
            .method(MethodDefinition::private("helper", |scope: &mut Scope<'_>| {
                scope.say("helping")?;
                Ok(())
            }));
        let output = build(vec![caller, hello()]).expect("build");

        assert_eq!(
            commands(&output, "demo:component/caller/go"),
            [
                "function demo:component/hello/say_hello",
                "function demo:component/caller/_private/helper",
                "function demo:attach/hello",
            ]
        );
    }

    #[test]
    fn failing_body_reports_labels_and_emits_nothing() {
        let broken = ComponentDefinition::new("demo", "broken").method(MethodDefinition::public(
            "explode",
            |_: &mut Scope<'_>| Err("bad body".into()),
        ));
        let error = build(vec![hello(), broken]).expect_err("should fail");

        assert_eq!(
            error.label_chain(),
            vec![
                "project \"Demo\"",
                "component \"broken\"",
                "component method \"explode\"",
            ]
        );
        assert_eq!(error.root_cause().to_string(), "bad body");
    }

    #[test]
    fn private_methods_are_not_callable_from_other_components() {
        let owner = ComponentDefinition::new("demo", "owner")
            .method(MethodDefinition::private("hidden", |_: &mut Scope<'_>| Ok(())));
        let intruder = ComponentDefinition::new("demo", "intruder").method(MethodDefinition::public(
            "peek",
            |scope: &mut Scope<'_>| Ok(scope.call("owner", "hidden")?),
        ));
        let error = build(vec![owner, intruder]).expect_err("private");
        let cause = error
            .root_cause()
            .downcast_ref::<CompileError>()
            .expect("compile error");
        assert_eq!(cause.code(), "METHOD_PRIVATE");
    }

    #[test]
    fn abstract_components_emit_methods_only() {
        let base = ComponentDefinition::new("demo", "base")
            .abstract_component()
            .method(
                MethodDefinition::public("pulse", |scope: &mut Scope<'_>| Ok(scope.say("pulse")?))
                    .tick(),
            );
        let child = ComponentDefinition::new("demo", "child").inherits("base");
        let output = build(vec![base, child]).expect("build");

        assert!(output.function("demo:component/base/pulse").is_some());
        assert!(output.function("demo:attach/base").is_none());
        assert!(output.tag("demo:component/callback/tick/base").is_none());
        assert_eq!(
            members(&output, "demo:component/callback/tick/child"),
            ["demo:component/child/base/pulse"]
        );
        assert!(output.function("demo:attach/child").is_some());
    }

    #[test]
    fn attaching_an_abstract_component_fails() {
        let base = ComponentDefinition::new("demo", "base").abstract_component();
        let user = ComponentDefinition::new("demo", "user").method(MethodDefinition::public(
            "spawn",
            |scope: &mut Scope<'_>| Ok(scope.attach("base")?),
        ));
        let error = build(vec![base, user]).expect_err("abstract");
        let cause = error
            .root_cause()
            .downcast_ref::<CompileError>()
            .expect("compile error");
        assert!(matches!(
            cause,
            CompileError::AbstractComponent { component } if component == "base"
        ));
    }

    #[test]
    fn guarded_methods_refuse_recursion() {
        let spin = MethodDefinition::public("spin", |scope: &mut Scope<'_>| Ok(scope.say("hi")?));
        let component = ComponentDefinition::new("demo", "loop").method(spin.guarded());
        let output = build(vec![component]).expect("build");

        let method = commands(&output, "demo:component/loop/spin");
        assert_eq!(method.len(), 2);
        assert!(method[0]
            .starts_with("execute if entity @e[tag=demo.generated.00000000] run tellraw @a"));
        assert!(method[0].contains("Recursive method invocation"));
        assert_eq!(
            method[1],
            concat!(
                "execute unless entity @e[tag=demo.generated.00000000] ",
                "run function demo:generated/00000000"
            )
        );
        assert_eq!(
            commands(&output, "demo:generated/00000000"),
            [
                "tag @s add demo.generated.00000000",
                "execute as @e[tag=demo.generated.00000000] run say hi",
                "tag @s remove demo.generated.00000000",
            ]
        );
    }

    #[test]
    fn extra_tags_are_merged_across_methods() {
        let a = MethodDefinition::public("a", |scope: &mut Scope<'_>| Ok(scope.say("a")?));
        let b = MethodDefinition::public("b", |scope: &mut Scope<'_>| Ok(scope.say("b")?));
        let component = ComponentDefinition::new("demo", "tagged")
            .method(a.tag("hooks/all"))
            .method(b.tag("demo:hooks/all"));
        let output = build(vec![component]).expect("build");
        assert_eq!(
            members(&output, "demo:hooks/all"),
            ["demo:component/tagged/a", "demo:component/tagged/b"]
        );
    }

    #[test]
    fn invalid_namespace_is_rejected() {
        let project = ProjectDefinition::new("Bad", "Not Valid");
        let error = ProjectBuilder::new(&project, &ResourceRegistry::new())
            .build()
            .expect_err("namespace");
        assert_eq!(error.label_chain(), vec!["project \"Bad\""]);
        let cause = error.root_cause().downcast_ref::<CompileError>().expect("cause");
        assert_eq!(cause.code(), "NAMESPACE_INVALID");
    }

    #[traced_test]
    #[test]
    fn build_logs_a_summary() {
        build(vec![hello()]).expect("build");
        assert!(logs_contain("built project"));
    }
}
