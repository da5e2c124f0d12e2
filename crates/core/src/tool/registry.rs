use std::sync::Arc;

use debt_chat_model::{ToolCallRequest, ToolCallResult, ToolDefinition};
use tokio_util::sync::CancellationToken;

use crate::tool::object::{ToolObject, ToolObjectImpl};
use crate::tool::{Error, Tool, ToolResult};

/// The set of tools exposed to the model, keyed by their wire name.
///
/// Definitions are listed in registration order, so requests built from the
/// same registry are always identical.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolObject>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any tool with the same name.
    pub fn register<T: Tool>(&mut self, tool: T) {
        let tool: Arc<dyn ToolObject> = Arc::new(ToolObjectImpl(tool));
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(existing) => {
                warn!("replacing tool with duplicated name: {}", tool.name());
                *existing = tool;
            }
            None => self.tools.push(tool),
        }
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the definitions of all registered tools.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Runs the tool a request refers to.
    ///
    /// Errors never escape this method, they are turned into a textual
    /// result so the model can read what went wrong.
    pub async fn invoke(
        &self,
        req: &ToolCallRequest,
        cancel: &CancellationToken,
    ) -> ToolCallResult {
        let result = self.execute(req, cancel).await;
        let content = match result {
            Ok(content) => content,
            Err(err) => {
                warn!("tool call ({}) failed: {err}", req.id);
                format!("Error: {err}")
            }
        };
        ToolCallResult {
            id: req.id.clone(),
            content,
        }
    }

    async fn execute(
        &self,
        req: &ToolCallRequest,
        cancel: &CancellationToken,
    ) -> ToolResult {
        let Some(tool) = self.tools.iter().find(|t| t.name() == req.name)
        else {
            return Err(Error::not_found().with_reason(format!(
                "no tool named `{}` is available",
                req.name
            )));
        };
        trace!("running a tool ({}) with args: {:?}", req.id, req.arguments);
        tool.execute(req.arguments.clone(), cancel.clone()).await
    }
}
