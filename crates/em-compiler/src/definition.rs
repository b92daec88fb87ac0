use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use em_core::naming::underscore;
use em_core::{BodyError, LifecycleHook, ResourceKind, Visibility};

use crate::scope::Scope;

pub type MethodBody = Arc<dyn Fn(&mut Scope<'_>) -> Result<(), BodyError> + Send + Sync>;

#[derive(Clone)]
pub struct MethodDefinition {
    pub name: String,
    pub visibility: Visibility,
    pub hooks: BTreeSet<LifecycleHook>,
    pub tags: BTreeSet<String>,
    pub recursion_guard: bool,
    body: MethodBody,
}

impl MethodDefinition {
    pub fn new<F>(name: impl Into<String>, visibility: Visibility, body: F) -> Self
    where
        F: Fn(&mut Scope<'_>) -> Result<(), BodyError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            visibility,
            hooks: BTreeSet::new(),
            tags: BTreeSet::new(),
            recursion_guard: false,
            body: Arc::new(body),
        }
    }

    pub fn public<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Scope<'_>) -> Result<(), BodyError> + Send + Sync + 'static,
    {
        Self::new(name, Visibility::Public, body)
    }

    pub fn private<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Scope<'_>) -> Result<(), BodyError> + Send + Sync + 'static,
    {
        Self::new(name, Visibility::Private, body)
    }

    pub fn hook(mut self, hook: LifecycleHook) -> Self {
        self.hooks.insert(hook);
        self
    }

    pub fn tick(self) -> Self {
        self.hook(LifecycleHook::Tick)
    }

    pub fn load(self) -> Self {
        self.hook(LifecycleHook::Load)
    }

    pub fn init(self) -> Self {
        self.hook(LifecycleHook::Init)
    }

    pub fn destroy(self) -> Self {
        self.hook(LifecycleHook::Destroy)
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn guarded(mut self) -> Self {
        self.recursion_guard = true;
        self
    }

    pub fn has_hook(&self, hook: LifecycleHook) -> bool {
        self.hooks.contains(&hook)
    }

    pub(crate) fn invoke(&self, scope: &mut Scope<'_>) -> Result<(), BodyError> {
        (self.body)(scope)
    }
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("hooks", &self.hooks)
            .field("tags", &self.tags)
            .field("recursion_guard", &self.recursion_guard)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    pub namespace: String,
    pub name: String,
    pub base: Option<String>,
    pub is_abstract: bool,
    pub methods: Vec<MethodDefinition>,
}

impl ComponentDefinition {
    /// Declared names are snake-cased, so `HelloWorld` registers as `hello_world`.
    pub fn new(namespace: impl Into<String>, name: &str) -> Self {
        Self {
            namespace: namespace.into(),
            name: underscore(name),
            base: None,
            is_abstract: false,
            methods: Vec::new(),
        }
    }

    pub fn inherits(mut self, base: &str) -> Self {
        self.base = Some(underscore(base));
        self
    }

    pub fn abstract_component(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(method);
        self
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDefinition> {
        self.methods.iter().find(|method| method.name == name)
    }
}

#[derive(Debug, Clone)]
pub enum ResourceDefinition {
    Component(Arc<ComponentDefinition>),
    Method(Arc<MethodDefinition>),
}

impl ResourceDefinition {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Component(_) => ResourceKind::Component,
            Self::Method(_) => ResourceKind::Method,
        }
    }

    pub fn as_component(&self) -> Option<&Arc<ComponentDefinition>> {
        match self {
            Self::Component(component) => Some(component),
            Self::Method(_) => None,
        }
    }
}

#[cfg(test)]
mod definition_tests {
    use super::*;
    use crate::Commands;

    #[test]
    fn method_builder_collects_hooks_and_tags() {
        let method = MethodDefinition::public("say_hello", |scope| {
            scope.say("hi")?;
            Ok(())
        })
        .tick()
        .init()
        .tag("demo:greetings")
        .guarded();

        assert!(method.has_hook(LifecycleHook::Tick));
        assert!(method.has_hook(LifecycleHook::Init));
        assert!(!method.has_hook(LifecycleHook::Load));
        assert!(method.tags.contains("demo:greetings"));
        assert!(method.recursion_guard);
        assert_eq!(method.visibility, Visibility::Public);
        assert!(format!("{:?}", method).contains("say_hello"));
    }

    #[test]
    fn component_names_are_snake_cased() {
        let component = ComponentDefinition::new("demo", "HelloWorld")
            .inherits("BaseThing")
            .abstract_component()
            .method(MethodDefinition::private("secret", |_| Ok(())));
        assert_eq!(component.name, "hello_world");
        assert_eq!(component.base.as_deref(), Some("base_thing"));
        assert!(component.is_abstract);
        assert!(component.find_method("secret").is_some());
        assert!(component.find_method("missing").is_none());

        let resource = ResourceDefinition::Component(Arc::new(component));
        assert_eq!(resource.kind(), ResourceKind::Component);
        assert!(resource.as_component().is_some());
    }
}
