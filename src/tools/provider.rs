//! Handler and provider capabilities.
//!
//! A [`ToolHandler`] executes one tool. A [`ToolProvider`] is a whole
//! integration: it advertises descriptors and executes any of them by name.
//! The dispatcher is generic over `ToolProvider`; [`ToolRegistry`] is the
//! provider that aggregates handlers and other providers at startup.
//!
//! [`ToolRegistry`]: crate::tools::ToolRegistry

use crate::tools::catalog::{Arguments, ToolDescriptor};
use crate::tools::content::ToolOutput;
use crate::types::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Outcome of a single handler execution.
pub type HandlerResult = Result<ToolOutput>;

/// Execution logic for a single tool.
///
/// Handlers receive arguments that already passed schema validation, with
/// defaults filled in. Handlers doing network or database I/O must bound it
/// with their own timeouts: the dispatch loop waits for every call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, args: Arguments) -> HandlerResult;
}

/// An integration exposing a set of tools.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Descriptors in the order they should be advertised.
    fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>>;

    /// Resolve a tool name.
    fn lookup(&self, name: &str) -> Option<ToolDescriptor> {
        self.list_descriptors()
            .ok()?
            .into_iter()
            .find(|d| d.name == name)
    }

    async fn invoke(&self, name: &str, args: Arguments) -> HandlerResult;
}

#[async_trait]
impl<P: ToolProvider + ?Sized> ToolProvider for Arc<P> {
    fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>> {
        (**self).list_descriptors()
    }

    fn lookup(&self, name: &str) -> Option<ToolDescriptor> {
        (**self).lookup(name)
    }

    async fn invoke(&self, name: &str, args: Arguments) -> HandlerResult {
        (**self).invoke(name, args).await
    }
}

// =============================================================================
// Closure handlers
// =============================================================================

/// Adapts a synchronous closure into a [`ToolHandler`].
pub struct FnHandler<F>(F);

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> ToolHandler for FnHandler<F>
where
    F: Fn(Arguments) -> HandlerResult + Send + Sync,
{
    async fn execute(&self, args: Arguments) -> HandlerResult {
        (self.0)(args)
    }
}

/// Wrap a closure as a shareable handler.
pub fn handler_fn<F>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Arguments) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// Routes one advertised tool back to the provider that owns it.
pub(crate) struct ProviderRoute {
    pub(crate) provider: Arc<dyn ToolProvider>,
    pub(crate) tool: String,
}

#[async_trait]
impl ToolHandler for ProviderRoute {
    async fn execute(&self, args: Arguments) -> HandlerResult {
        self.provider.invoke(&self.tool, args).await
    }
}
