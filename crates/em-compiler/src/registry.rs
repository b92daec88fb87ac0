use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use em_core::naming::{is_valid_name, is_valid_namespace};
use em_core::{CompileError, ResourceKind};
use tracing::debug;

use crate::definition::{ComponentDefinition, ResourceDefinition};

pub type ResourceTable = BTreeMap<String, ResourceDefinition>;
pub type KindTable = BTreeMap<ResourceKind, ResourceTable>;

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    namespaces: BTreeMap<String, KindTable>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        namespace: &str,
        kind: ResourceKind,
        name: &str,
        definition: ResourceDefinition,
    ) -> Result<(), CompileError> {
        if definition.kind() != kind {
            return Err(CompileError::new(
                "RESOURCE_KIND_MISMATCH",
                format!(
                    "Cannot register {} \"{}\" as a {}.",
                    definition.kind(),
                    name,
                    kind
                ),
            ));
        }

        let resources = self
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .entry(kind)
            .or_default();

        if resources.contains_key(name) {
            return Err(CompileError::DuplicateResource {
                namespace: namespace.to_string(),
                kind,
                name: name.to_string(),
            });
        }

        debug!(namespace, %kind, name, "registered resource");
        resources.insert(name.to_string(), definition);
        Ok(())
    }

    pub fn register_component(
        &mut self,
        component: ComponentDefinition,
    ) -> Result<Arc<ComponentDefinition>, CompileError> {
        validate_component(&component)?;
        let component = Arc::new(component);
        self.register(
            &component.namespace,
            ResourceKind::Component,
            &component.name,
            ResourceDefinition::Component(Arc::clone(&component)),
        )?;
        Ok(component)
    }

    pub fn lookup(&self, namespace: &str) -> Option<&KindTable> {
        self.namespaces.get(namespace)
    }

    pub fn component(&self, namespace: &str, name: &str) -> Option<Arc<ComponentDefinition>> {
        self.lookup(namespace)?
            .get(&ResourceKind::Component)?
            .get(name)?
            .as_component()
            .cloned()
    }

    pub fn components(&self, namespace: &str) -> Vec<Arc<ComponentDefinition>> {
        self.lookup(namespace)
            .and_then(|kinds| kinds.get(&ResourceKind::Component))
            .map(|resources| {
                resources
                    .values()
                    .filter_map(ResourceDefinition::as_component)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(|kinds| kinds.values().all(BTreeMap::is_empty))
    }

    pub fn clear_all(&mut self) {
        self.namespaces.clear();
    }
}

fn validate_component(component: &ComponentDefinition) -> Result<(), CompileError> {
    if !is_valid_namespace(&component.namespace) {
        return Err(CompileError::new(
            "NAMESPACE_INVALID",
            format!("Invalid namespace \"{}\".", component.namespace),
        ));
    }

    if !is_valid_name(&component.name) {
        return Err(CompileError::new(
            "COMPONENT_NAME_INVALID",
            format!("Invalid component name \"{}\".", component.name),
        ));
    }

    let mut seen = BTreeSet::new();
    for method in &component.methods {
        if !is_valid_name(&method.name) {
            return Err(CompileError::new(
                "METHOD_NAME_INVALID",
                format!(
                    "Invalid method name \"{}\" in component \"{}\".",
                    method.name, component.name
                ),
            ));
        }
        if !seen.insert(method.name.as_str()) {
            return Err(CompileError::DuplicateResource {
                namespace: component.namespace.clone(),
                kind: ResourceKind::Method,
                name: format!("{}/{}", component.name, method.name),
            });
        }
    }

    Ok(())
}
