//! Per-request policy context.
//!
//! A [`PolicyContext`] accompanies one proxied call through the policy
//! chain. It carries a string-keyed attribute bag scoped to the request
//! lifetime, access to process-wide engine components, and the
//! connector-interceptor slot. The context is created when the chain is
//! entered and dropped when the chain completes; it is only ever touched by
//! the task servicing that request.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::connector::ConnectorInterceptor;
use crate::error::PolicyError;

/// Process-wide registry of engine components available to policies.
///
/// Components are registered once at engine start and looked up by type.
/// Lookups clone the stored value, so components are registered as cheaply
/// cloneable handles (typically `Arc`).
#[derive(Default)]
pub struct ComponentRegistry {
    components: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component handle, replacing any previous one of the same
    /// type.
    pub fn register<T: Any + Send + Sync>(&mut self, component: T) {
        self.components
            .insert(TypeId::of::<T>(), Box::new(component));
    }

    /// Looks up a component handle by type.
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.components
            .get(&TypeId::of::<T>())
            .and_then(|component| component.downcast_ref::<T>())
            .cloned()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.components.len())
            .finish()
    }
}

/// Per-request state bag shared along the policy chain.
///
/// Attribute names are opaque strings that must be process-unique; policies
/// conventionally prefix them with their own namespace. Values are typed:
/// reading an attribute under the wrong type behaves as if it were absent.
pub struct PolicyContext {
    components: Arc<ComponentRegistry>,
    attributes: HashMap<SmolStr, Box<dyn Any + Send + Sync>>,
    interceptor: Option<Arc<dyn ConnectorInterceptor>>,
}

impl PolicyContext {
    /// Creates the context for one request.
    pub fn new(components: Arc<ComponentRegistry>) -> Self {
        PolicyContext {
            components,
            attributes: HashMap::new(),
            interceptor: None,
        }
    }

    /// Looks up an engine component, failing when it is not registered.
    pub fn component<T: Any + Clone>(&self) -> Result<T, PolicyError> {
        self.components
            .get::<T>()
            .ok_or(PolicyError::ComponentMissing(type_name::<T>()))
    }

    /// Stores an attribute under the given name.
    pub fn set_attribute<T: Any + Send + Sync>(&mut self, name: &str, value: T) {
        self.attributes.insert(SmolStr::new(name), Box::new(value));
    }

    /// Reads an attribute by name.
    pub fn attribute<T: Any>(&self, name: &str) -> Option<&T> {
        self.attributes
            .get(name)
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Reads a copyable attribute, falling back to a default when absent.
    pub fn attribute_or<T: Any + Copy>(&self, name: &str, default: T) -> T {
        self.attribute::<T>(name).copied().unwrap_or(default)
    }

    /// Installs a connector interceptor for this request.
    pub fn set_connector_interceptor(&mut self, interceptor: Arc<dyn ConnectorInterceptor>) {
        self.interceptor = Some(interceptor);
    }

    /// The installed connector interceptor, if any.
    pub fn connector_interceptor(&self) -> Option<&Arc<dyn ConnectorInterceptor>> {
        self.interceptor.as_ref()
    }
}

impl std::fmt::Debug for PolicyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyContext")
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_are_typed() {
        let mut ctx = PolicyContext::new(Arc::new(ComponentRegistry::new()));
        ctx.set_attribute("flag", true);
        assert_eq!(ctx.attribute::<bool>("flag"), Some(&true));
        assert_eq!(ctx.attribute::<String>("flag"), None);
        assert!(ctx.attribute_or("flag", false));
        assert!(!ctx.attribute_or("missing", false));
    }

    #[test]
    fn attributes_can_be_overwritten() {
        let mut ctx = PolicyContext::new(Arc::new(ComponentRegistry::new()));
        ctx.set_attribute("value", 1u64);
        ctx.set_attribute("value", 2u64);
        assert_eq!(ctx.attribute_or("value", 0u64), 2);
    }

    #[test]
    fn missing_component_is_an_error() {
        let ctx = PolicyContext::new(Arc::new(ComponentRegistry::new()));
        let result = ctx.component::<Arc<String>>();
        assert!(matches!(result, Err(PolicyError::ComponentMissing(_))));
    }

    #[test]
    fn registered_components_are_cloned_out() {
        let mut registry = ComponentRegistry::new();
        registry.register(Arc::new("component".to_owned()));
        let ctx = PolicyContext::new(Arc::new(registry));
        let component: Arc<String> = ctx.component().unwrap();
        assert_eq!(component.as_str(), "component");
    }
}
