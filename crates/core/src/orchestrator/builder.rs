use std::sync::Arc;

use debt_chat_model::ModelProvider;

use super::Orchestrator;
use crate::backend::{ChatBackend, ToolInvokingBackend};
use crate::conversation::Conversation;
use crate::tool::{Tool, ToolRegistry};

/// [`Orchestrator`] builder.
pub struct OrchestratorBuilder {
    backend: Arc<dyn ChatBackend>,
    system_prompt: String,
    tools: ToolRegistry,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the specified backend.
    #[inline]
    pub fn with_backend<B: ChatBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            system_prompt: String::new(),
            tools: ToolRegistry::new(),
        }
    }

    /// Creates a new builder over a raw model provider, running tools with
    /// a [`ToolInvokingBackend`].
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self::with_backend(ToolInvokingBackend::new(provider))
    }

    /// Sets the system instructions.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Orchestrator {
        Orchestrator {
            backend: self.backend,
            tools: self.tools,
            conversation: Conversation::new(self.system_prompt),
        }
    }
}
