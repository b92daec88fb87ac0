use std::collections::BTreeMap;

use em_core::{CompileError, Visibility};

use crate::component::ResolvedMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    pub location: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Default)]
pub struct ComponentDispatch {
    pub is_abstract: bool,
    methods: BTreeMap<String, DispatchEntry>,
}

impl ComponentDispatch {
    pub fn method(&self, name: &str) -> Option<&DispatchEntry> {
        self.methods.get(name)
    }
}

/// Method name to generated function, per component. Calls to a method are
/// emitted as calls to the function it was built into.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    components: BTreeMap<String, ComponentDispatch>,
}

impl DispatchTable {
    pub fn insert_component(
        &mut self,
        component: &str,
        is_abstract: bool,
        methods: &[ResolvedMethod],
    ) {
        let mut dispatch = ComponentDispatch {
            is_abstract,
            methods: BTreeMap::new(),
        };
        for method in methods {
            let entry = DispatchEntry {
                location: method.location.clone(),
                visibility: method.definition.visibility,
            };
            dispatch.methods.insert(method.key.clone(), entry.clone());
            // Methods are resolved nearest-first, so the first bare name wins.
            dispatch
                .methods
                .entry(method.definition.name.clone())
                .or_insert(entry);
        }
        self.components.insert(component.to_string(), dispatch);
    }

    pub fn component(&self, name: &str) -> Option<&ComponentDispatch> {
        self.components.get(name)
    }

    pub fn resolve(
        &self,
        caller: Option<&str>,
        component: &str,
        method: &str,
    ) -> Result<&DispatchEntry, CompileError> {
        let dispatch = self.component(component).ok_or_else(|| {
            CompileError::new(
                "COMPONENT_NOT_FOUND",
                format!("Component \"{}\" is not declared.", component),
            )
        })?;
        let entry = dispatch.method(method).ok_or_else(|| {
            CompileError::new(
                "METHOD_NOT_FOUND",
                format!(
                    "Component \"{}\" has no method \"{}\".",
                    component, method
                ),
            )
        })?;
        if entry.visibility == Visibility::Private && caller != Some(component) {
            return Err(CompileError::new(
                "METHOD_PRIVATE",
                format!(
                    "Method \"{}\" of component \"{}\" is private.",
                    method, component
                ),
            ));
        }
        Ok(entry)
    }
}
