mod builder;

use std::sync::Arc;

use debt_chat_model::{ChatMessage, ToolDefinition};
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::backend::{ChatBackend, ChatRequest, ChatResponse, ChatUpdate};
use crate::conversation::Conversation;
use crate::error::Error;
use crate::tool::ToolRegistry;
pub use builder::OrchestratorBuilder;

/// Returned by [`Orchestrator::send_message`] when the backend produced no
/// text at all.
pub const FALLBACK_RESPONSE: &str = "I couldn't generate a response.";

/// Drives one chat session: owns the history and the tools, and runs each
/// user message through the backend.
///
/// One message is processed at a time, which the `&mut self` receivers
/// enforce. History is appended in strict order: the user message first,
/// then every turn the backend produced once the exchange has completed.
/// If the exchange fails or is cancelled, only the user message is kept.
pub struct Orchestrator {
    backend: Arc<dyn ChatBackend>,
    tools: ToolRegistry,
    conversation: Conversation,
}

impl Orchestrator {
    /// Returns the conversation so far, system instructions first.
    #[inline]
    pub fn history(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    /// Returns the definitions of the tools offered to the model.
    #[inline]
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions()
    }

    /// Sends a user message and waits for the complete answer.
    pub async fn send_message<S: Into<String>>(
        &mut self,
        text: S,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        self.conversation.push(ChatMessage::user(text));

        let request = ChatRequest {
            messages: self.conversation.messages(),
            tools: &self.tools,
            cancel,
        };
        let result = select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            resp = self.backend.complete(request) => resp.map_err(Error::from),
        };

        let text = self.finish_exchange(result)?;
        if text.is_empty() {
            return Ok(FALLBACK_RESPONSE.to_owned());
        }
        Ok(text)
    }

    /// Sends a user message and forwards each piece of answer text to
    /// `on_chunk` as soon as it arrives.
    ///
    /// Empty deltas are never forwarded. Returns the full answer text once
    /// the exchange has completed.
    pub async fn send_message_streaming<S, F>(
        &mut self,
        text: S,
        cancel: &CancellationToken,
        mut on_chunk: F,
    ) -> Result<String, Error>
    where
        S: Into<String>,
        F: FnMut(&str) + Send,
    {
        self.conversation.push(ChatMessage::user(text));

        let mut on_update = |update: ChatUpdate| match update {
            ChatUpdate::TextDelta(delta) if !delta.is_empty() => on_chunk(&delta),
            ChatUpdate::ToolCall(call) => debug!("waiting for tool `{}`", call.name),
            _ => {}
        };
        let request = ChatRequest {
            messages: self.conversation.messages(),
            tools: &self.tools,
            cancel,
        };
        let result = select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            resp = self.backend.complete_streaming(request, &mut on_update) => {
                resp.map_err(Error::from)
            }
        };

        self.finish_exchange(result)
    }

    /// Discards the conversation, keeping only the system instructions.
    pub fn reset(&mut self) {
        debug!("resetting conversation");
        self.conversation.reset();
    }

    fn finish_exchange(
        &mut self,
        result: Result<ChatResponse, Error>,
    ) -> Result<String, Error> {
        let response = match result {
            Ok(response) => response,
            Err(Error::Cancelled) => {
                debug!("exchange cancelled, dropping partial output");
                return Err(Error::Cancelled);
            }
            Err(err) => {
                error!("backend failed: {err}");
                return Err(err);
            }
        };
        let text = response.text();
        trace!("exchange produced {} turns", response.messages.len());
        self.conversation.extend(response.messages);
        Ok(text)
    }
}
