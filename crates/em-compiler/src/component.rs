use std::collections::BTreeSet;
use std::sync::Arc;

use em_core::naming::{
    attach_function, callback_tag, component_function, detach_function, marker_tag, qualify,
};
use em_core::{BodyError, Clause, CompileError, LifecycleHook};
use tracing::debug;

use crate::context::BuildContext;
use crate::definition::{ComponentDefinition, MethodDefinition};
use crate::function::build_function;
use crate::guard::with_context;
use crate::registry::ResourceRegistry;
use crate::scope::{Commands, Scope};
use crate::tree::{NodeId, NodeKind, NodePayload};

#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    /// `name` for local methods, `<origin>/<name>` for inherited ones.
    pub key: String,
    pub origin: Option<String>,
    pub location: String,
    pub hooks: BTreeSet<LifecycleHook>,
    pub overridden: bool,
    pub definition: MethodDefinition,
}

impl ResolvedMethod {
    pub fn has_hook(&self, hook: LifecycleHook) -> bool {
        self.hooks.contains(&hook)
    }
}

struct CollectedMethod {
    origin: Option<String>,
    hooks: BTreeSet<LifecycleHook>,
    overridden: bool,
    definition: MethodDefinition,
}

/// Local methods first, then inherited ones nearest base first. Inherited
/// methods overridden locally lose their lifecycle hooks.
pub fn resolve_methods(
    component: &ComponentDefinition,
    registry: &ResourceRegistry,
) -> Result<Vec<ResolvedMethod>, CompileError> {
    let collected = collect_methods(component, registry, &mut Vec::new())?;
    Ok(collected
        .into_iter()
        .map(|method| {
            let name = &method.definition.name;
            let key = match &method.origin {
                Some(origin) => format!("{}/{}", origin, name),
                None => name.clone(),
            };
            ResolvedMethod {
                location: component_function(
                    &component.namespace,
                    &component.name,
                    method.origin.as_deref(),
                    method.definition.visibility,
                    name,
                ),
                key,
                origin: method.origin,
                hooks: method.hooks,
                overridden: method.overridden,
                definition: method.definition,
            }
        })
        .collect())
}

fn collect_methods(
    component: &ComponentDefinition,
    registry: &ResourceRegistry,
    chain: &mut Vec<String>,
) -> Result<Vec<CollectedMethod>, CompileError> {
    if chain.contains(&component.name) {
        chain.push(component.name.clone());
        return Err(CompileError::new(
            "INHERITANCE_CYCLE",
            format!("Inheritance cycle detected: {}", chain.join(" -> ")),
        ));
    }
    chain.push(component.name.clone());

    let mut methods = component
        .methods
        .iter()
        .map(|definition| CollectedMethod {
            origin: None,
            hooks: definition.hooks.clone(),
            overridden: false,
            definition: definition.clone(),
        })
        .collect::<Vec<_>>();

    if let Some(base_name) = &component.base {
        let base = registry
            .component(&component.namespace, base_name)
            .ok_or_else(|| {
                CompileError::new(
                    "BASE_COMPONENT_NOT_FOUND",
                    format!(
                        "Component \"{}\" inherits from unknown component \"{}\".",
                        component.name, base_name
                    ),
                )
            })?;

        for mut inherited in collect_methods(&base, registry, chain)? {
            inherited.origin.get_or_insert_with(|| base.name.clone());
            if component.find_method(&inherited.definition.name).is_some() {
                inherited.hooks.clear();
                inherited.overridden = true;
            }
            methods.push(inherited);
        }
    }

    chain.pop();
    Ok(methods)
}

pub(crate) fn build_component(
    ctx: &mut BuildContext,
    project: NodeId,
    component: &Arc<ComponentDefinition>,
    methods: &[ResolvedMethod],
) -> Result<(), CompileError> {
    with_context(format!("component \"{}\"", component.name), || {
        let node = ctx.tree_mut().insert(
            Some(project),
            component.name.clone(),
            NodePayload::Component {
                component: Arc::clone(component),
            },
        );
        debug!(
            component = %component.name,
            methods = methods.len(),
            is_abstract = component.is_abstract,
            "building component"
        );

        ctx.with_active(NodeKind::Component, node, |ctx| {
            for method in methods {
                build_method(ctx, node, component, method)?;
            }
            if component.is_abstract {
                return Ok(());
            }
            build_dispatchers(ctx, node, component, methods)?;
            build_attach(ctx, node, component, methods)?;
            build_detach(ctx, node, component, methods)?;
            Ok::<(), BodyError>(())
        })
    })
}

fn build_method(
    ctx: &mut BuildContext,
    component_node: NodeId,
    component: &ComponentDefinition,
    method: &ResolvedMethod,
) -> Result<(), CompileError> {
    with_context(format!("component method \"{}\"", method.key), || {
        let node = ctx.tree_mut().insert(
            Some(component_node),
            method.key.clone(),
            NodePayload::Method {
                method: Box::new(method.clone()),
            },
        );

        ctx.with_active(NodeKind::Method, node, |ctx| {
            build_function(ctx, node, &method.location, |scope| {
                if method.definition.recursion_guard {
                    run_guarded(scope, component, method)
                } else {
                    method.definition.invoke(scope)
                }
            })?;

            let namespace = component.namespace.as_str();
            if !component.is_abstract {
                for hook in &method.hooks {
                    let tag = callback_tag(namespace, *hook, &component.name);
                    insert_tag(ctx, node, tag, &method.location);
                }
            }
            for tag in &method.definition.tags {
                insert_tag(ctx, node, qualify(namespace, tag), &method.location);
            }
            Ok::<(), BodyError>(())
        })
    })
}

fn run_guarded(
    scope: &mut Scope<'_>,
    component: &ComponentDefinition,
    method: &ResolvedMethod,
) -> Result<(), BodyError> {
    let identifier = scope.fresh_tag();
    let selector = format!("@e[tag={}]", identifier);

    scope
        .execute([Clause::new(["if", "entity", selector.as_str()])])
        .error(format!(
            "Recursive method invocation \"{}/{}\"",
            component.name, method.key
        ))?;

    scope
        .execute([Clause::new(["unless", "entity", selector.as_str()])])
        .block(|scope| {
            scope.add_tag(&identifier)?;
            scope
                .execute([Clause::new(["as", selector.as_str()])])
                .block(|scope| method.definition.invoke(scope))?;
            scope.remove_tag(&identifier)?;
            Ok(())
        })
}

fn build_dispatchers(
    ctx: &mut BuildContext,
    node: NodeId,
    component: &ComponentDefinition,
    methods: &[ResolvedMethod],
) -> Result<(), BodyError> {
    let marker = marker_tag(&component.namespace, &component.name);
    for hook in LifecycleHook::ALL {
        let Some(runtime_tag) = hook.runtime_tag() else {
            continue;
        };
        if !methods.iter().any(|method| method.has_hook(hook)) {
            continue;
        }

        let callback = callback_tag(&component.namespace, hook, &component.name);
        let location = ctx.next_function_name();
        build_function(ctx, node, &location, |scope| {
            scope
                .execute([Clause::new(["as".to_string(), format!("@e[tag={}]", marker)])])
                .function_tag(&callback)?;
            Ok(())
        })?;
        insert_tag(ctx, node, runtime_tag.to_string(), &location);
    }
    Ok(())
}

fn build_attach(
    ctx: &mut BuildContext,
    node: NodeId,
    component: &ComponentDefinition,
    methods: &[ResolvedMethod],
) -> Result<(), BodyError> {
    let marker = marker_tag(&component.namespace, &component.name);
    let init = methods
        .iter()
        .any(|method| method.has_hook(LifecycleHook::Init))
        .then(|| callback_tag(&component.namespace, LifecycleHook::Init, &component.name));
    let location = attach_function(&component.namespace, &component.name);

    build_function(ctx, node, &location, |scope| {
        scope
            .execute([marker_clause("unless", &marker)])
            .block(|scope| {
                scope.add_tag(&marker)?;
                if let Some(init) = &init {
                    scope.function_tag(init)?;
                }
                Ok(())
            })
    })?;
    Ok(())
}

fn build_detach(
    ctx: &mut BuildContext,
    node: NodeId,
    component: &ComponentDefinition,
    methods: &[ResolvedMethod],
) -> Result<(), BodyError> {
    let marker = marker_tag(&component.namespace, &component.name);
    let destroy = methods
        .iter()
        .any(|method| method.has_hook(LifecycleHook::Destroy))
        .then(|| callback_tag(&component.namespace, LifecycleHook::Destroy, &component.name));
    let location = detach_function(&component.namespace, &component.name);

    build_function(ctx, node, &location, |scope| {
        scope.execute([marker_clause("if", &marker)]).block(|scope| {
            if let Some(destroy) = &destroy {
                scope.function_tag(destroy)?;
            }
            scope.remove_tag(&marker)?;
            Ok(())
        })
    })?;
    Ok(())
}

fn marker_clause(condition: &str, marker: &str) -> Clause {
    Clause::new([
        condition.to_string(),
        "entity".to_string(),
        format!("@s[tag={}]", marker),
    ])
}

fn insert_tag(ctx: &mut BuildContext, parent: NodeId, location: String, member: &str) {
    ctx.tree_mut().insert(
        Some(parent),
        location.clone(),
        NodePayload::Tag {
            location,
            members: vec![member.to_string()],
        },
    );
}

#[cfg(test)]
mod component_tests {
    use super::*;
    use crate::dispatch::DispatchTable;
    use em_core::Visibility;

    fn noop(_: &mut Scope<'_>) -> Result<(), BodyError> {
        Ok(())
    }

    fn registry(components: Vec<ComponentDefinition>) -> ResourceRegistry {
        let mut registry = ResourceRegistry::new();
        for component in components {
            registry.register_component(component).expect("register");
        }
        registry
    }

    #[test]
    fn inherited_methods_are_keyed_by_origin() {
        let registry = registry(vec![
            ComponentDefinition::new("demo", "Animal")
                .abstract_component()
                .method(MethodDefinition::public("speak", noop).tick())
                .method(MethodDefinition::private("breathe", noop).init()),
            ComponentDefinition::new("demo", "Dog")
                .inherits("Animal")
                .method(MethodDefinition::public("speak", noop)),
        ]);
        let dog = registry.component("demo", "dog").expect("dog");
        let methods = resolve_methods(&dog, &registry).expect("resolve");

        let keys = methods.iter().map(|m| m.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["speak", "animal/speak", "animal/breathe"]);
        assert_eq!(methods[0].location, "demo:component/dog/speak");
        assert_eq!(methods[1].location, "demo:component/dog/animal/speak");
        assert_eq!(methods[2].location, "demo:component/dog/animal/_private/breathe");

        assert!(methods[1].overridden);
        assert!(methods[1].hooks.is_empty());
        assert!(!methods[2].overridden);
        assert!(methods[2].has_hook(LifecycleHook::Init));
    }

    #[test]
    fn origin_is_the_declaring_ancestor() {
        let registry = registry(vec![
            ComponentDefinition::new("demo", "base").method(MethodDefinition::public("a", noop)),
            ComponentDefinition::new("demo", "middle").inherits("base"),
            ComponentDefinition::new("demo", "leaf").inherits("middle"),
        ]);
        let leaf = registry.component("demo", "leaf").expect("leaf");
        let methods = resolve_methods(&leaf, &registry).expect("resolve");
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].key, "base/a");
        assert_eq!(methods[0].location, "demo:component/leaf/base/a");
    }

    #[test]
    fn inheritance_cycles_are_reported_with_the_chain() {
        let registry = registry(vec![
            ComponentDefinition::new("demo", "a").inherits("b"),
            ComponentDefinition::new("demo", "b").inherits("a"),
        ]);
        let a = registry.component("demo", "a").expect("a");
        let error = resolve_methods(&a, &registry).expect_err("cycle");
        assert_eq!(error.code(), "INHERITANCE_CYCLE");
        assert!(error.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn unknown_base_is_rejected() {
        let registry = registry(vec![ComponentDefinition::new("demo", "orphan").inherits("ghost")]);
        let orphan = registry.component("demo", "orphan").expect("orphan");
        let error = resolve_methods(&orphan, &registry).expect_err("missing base");
        assert_eq!(error.code(), "BASE_COMPONENT_NOT_FOUND");
    }

    #[test]
    fn dispatch_prefers_nearest_definition_and_guards_private_methods() {
        let registry = registry(vec![
            ComponentDefinition::new("demo", "base")
                .method(MethodDefinition::public("greet", noop))
                .method(MethodDefinition::private("secret", noop)),
            ComponentDefinition::new("demo", "child")
                .inherits("base")
                .method(MethodDefinition::public("greet", noop)),
        ]);
        let child = registry.component("demo", "child").expect("child");
        let methods = resolve_methods(&child, &registry).expect("resolve");
        let mut dispatch = DispatchTable::default();
        dispatch.insert_component("child", false, &methods);

        let greet = dispatch.resolve(None, "child", "greet").expect("greet");
        assert_eq!(greet.location, "demo:component/child/greet");
        let inherited = dispatch
            .resolve(None, "child", "base/greet")
            .expect("inherited");
        assert_eq!(inherited.location, "demo:component/child/base/greet");

        let secret = dispatch
            .resolve(Some("child"), "child", "secret")
            .expect("own private");
        assert_eq!(secret.visibility, Visibility::Private);
        assert_eq!(
            dispatch
                .resolve(Some("other"), "child", "secret")
                .expect_err("foreign")
                .code(),
            "METHOD_PRIVATE"
        );
        assert_eq!(
            dispatch.resolve(None, "child", "missing").expect_err("missing").code(),
            "METHOD_NOT_FOUND"
        );
        assert_eq!(
            dispatch.resolve(None, "ghost", "greet").expect_err("ghost").code(),
            "COMPONENT_NOT_FOUND"
        );
    }
}
