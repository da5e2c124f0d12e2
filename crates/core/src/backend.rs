//! The chat backend abstraction the orchestrator talks to.

mod tool_invoking;

use async_trait::async_trait;
use debt_chat_model::{
    ChatMessage, ChatRole, ModelFinishReason, ToolCallRequest, ToolCallResult,
};
use tokio_util::sync::CancellationToken;

use crate::error::BackendError;
use crate::tool::ToolRegistry;
pub use tool_invoking::ToolInvokingBackend;

/// Everything a backend needs for one exchange.
#[derive(Clone, Copy)]
pub struct ChatRequest<'a> {
    /// The full history, system instructions first.
    pub messages: &'a [ChatMessage],
    /// Tools the model may call.
    pub tools: &'a ToolRegistry,
    /// Fires when the caller gives up on the exchange.
    pub cancel: &'a CancellationToken,
}

/// The result of one exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatResponse {
    /// Turns produced during the exchange, in order. This includes
    /// assistant turns requesting tools and the matching tool results.
    pub messages: Vec<ChatMessage>,
    /// Why the final model turn stopped.
    pub finish_reason: Option<ModelFinishReason>,
}

impl ChatResponse {
    /// Returns the text of all assistant turns, concatenated.
    pub fn text(&self) -> String {
        self.messages
            .iter()
            .filter(|msg| msg.role() == ChatRole::Assistant)
            .map(ChatMessage::content)
            .collect()
    }
}

/// A partial update of an exchange in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatUpdate {
    /// A piece of assistant text.
    TextDelta(String),
    /// The model asked for a tool.
    ToolCall(ToolCallRequest),
    /// A tool finished and its output went back to the model.
    ToolResult(ToolCallResult),
}

/// A chat-completion backend.
///
/// Backends own tool dispatch: given the registry they decide when to run
/// tools and feed the results back, and only hand back once the model has
/// produced its final answer.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Runs one exchange and returns all produced turns at once.
    async fn complete(
        &self,
        request: ChatRequest<'_>,
    ) -> Result<ChatResponse, BackendError> {
        self.complete_streaming(request, &mut |_| {}).await
    }

    /// Runs one exchange, reporting partial updates as they arrive.
    ///
    /// The returned response must contain the same turns the updates
    /// described.
    async fn complete_streaming(
        &self,
        request: ChatRequest<'_>,
        on_update: &mut (dyn FnMut(ChatUpdate) + Send),
    ) -> Result<ChatResponse, BackendError>;
}
