//! Tool registry: descriptors in registration order, handlers by name.

use crate::tools::catalog::{Arguments, ToolDescriptor};
use crate::tools::provider::{HandlerResult, ProviderRoute, ToolHandler, ToolProvider};
use crate::types::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Registered tools, populated at startup.
///
/// Re-registering a name replaces the descriptor and handler (last write
/// wins) while keeping the tool's original position in [`list`](Self::list).
#[derive(Default)]
pub struct ToolRegistry {
    order: Vec<String>,
    entries: HashMap<String, RegisteredTool>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with its handler.
    pub fn register(&mut self, descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) -> Result<()> {
        if descriptor.name.is_empty() {
            return Err(Error::validation("Tool name cannot be empty"));
        }

        let name = descriptor.name.clone();
        let replaced = self
            .entries
            .insert(name.clone(), RegisteredTool { descriptor, handler })
            .is_some();
        if replaced {
            tracing::warn!(tool = %name, "tool re-registered, replacing previous descriptor");
        } else {
            self.order.push(name);
        }
        Ok(())
    }

    /// Register every tool a provider advertises, routed back to it.
    ///
    /// Returns the number of tools registered.
    pub fn register_provider(&mut self, provider: Arc<dyn ToolProvider>) -> Result<usize> {
        let descriptors = provider.list_descriptors()?;
        let count = descriptors.len();
        for descriptor in descriptors {
            let route = ProviderRoute {
                provider: provider.clone(),
                tool: descriptor.name.clone(),
            };
            self.register(descriptor, Arc::new(route))?;
        }
        Ok(count)
    }

    /// Get a descriptor by name.
    pub fn lookup(&self, name: &str) -> Result<&ToolDescriptor> {
        self.entries
            .get(name)
            .map(|t| &t.descriptor)
            .ok_or_else(|| Error::not_found(format!("Unknown tool: {}", name)))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|t| t.descriptor.clone())
            .collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ToolProvider for ToolRegistry {
    fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.list())
    }

    fn lookup(&self, name: &str) -> Option<ToolDescriptor> {
        ToolRegistry::lookup(self, name).ok().cloned()
    }

    async fn invoke(&self, name: &str, args: Arguments) -> HandlerResult {
        let handler = self
            .entries
            .get(name)
            .map(|t| t.handler.clone())
            .ok_or_else(|| Error::not_found(format!("Unknown tool: {}", name)))?;
        handler.execute(args).await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::ParamDef;
    use crate::tools::content::ToolOutput;
    use crate::tools::provider::handler_fn;

    fn constant(text: &'static str) -> Arc<dyn ToolHandler> {
        handler_fn(move |_| Ok(ToolOutput::from(text)))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDescriptor::new("echo", "Echo back the input"), constant("x"))
            .unwrap();

        assert!(registry.has_tool("echo"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("echo").unwrap().description, "Echo back the input");
    }

    #[test]
    fn test_lookup_unknown_is_not_found() {
        let registry = ToolRegistry::new();
        assert!(matches!(registry.lookup("nonexistent"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_register_empty_name_fails() {
        let mut registry = ToolRegistry::new();
        assert!(registry
            .register(ToolDescriptor::new("", "nameless"), constant("x"))
            .is_err());
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDescriptor::new("a", "first"), constant("x"))
            .unwrap();
        registry
            .register(ToolDescriptor::new("b", "other"), constant("x"))
            .unwrap();
        registry
            .register(
                ToolDescriptor::new("a", "second").param(ParamDef::string("q", "query")),
                constant("y"),
            )
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("a").unwrap().description, "second");

        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(ToolDescriptor::new(name, name), constant("x"))
                .unwrap();
        }
        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_replaced_handler_is_invoked() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDescriptor::new("a", "first"), constant("old"))
            .unwrap();
        registry
            .register(ToolDescriptor::new("a", "second"), constant("new"))
            .unwrap();

        let output = registry.invoke("a", Arguments::new()).await.unwrap();
        assert_eq!(output, ToolOutput::Text("new".into()));
    }

    struct Pair;

    #[async_trait]
    impl ToolProvider for Pair {
        fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>> {
            Ok(vec![
                ToolDescriptor::new("left", "left tool"),
                ToolDescriptor::new("right", "right tool"),
            ])
        }

        async fn invoke(&self, name: &str, _args: Arguments) -> HandlerResult {
            Ok(ToolOutput::Text(format!("called {}", name)))
        }
    }

    #[tokio::test]
    async fn test_register_provider_routes_by_name() {
        let mut registry = ToolRegistry::new();
        let count = registry.register_provider(Arc::new(Pair)).unwrap();
        assert_eq!(count, 2);

        let output = registry.invoke("right", Arguments::new()).await.unwrap();
        assert_eq!(output, ToolOutput::Text("called right".into()));
    }
}
