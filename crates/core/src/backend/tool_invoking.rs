use async_trait::async_trait;
use debt_chat_model::{ChatMessage, ModelProvider, ModelRequest};

use super::{ChatBackend, ChatRequest, ChatResponse, ChatUpdate};
use crate::error::BackendError;
use crate::model_client::send_request;

const DEFAULT_MAX_ROUNDS: usize = 10;

/// A [`ChatBackend`] over a raw [`ModelProvider`] that runs requested tools
/// itself and loops until the model answers without calling any.
///
/// Tools requested in one turn run sequentially, in the order the model
/// listed them. After `max_rounds` rounds of tool calls, a last request is
/// made with no tools offered so the model has to answer.
pub struct ToolInvokingBackend<P> {
    provider: P,
    max_rounds: usize,
}

impl<P: ModelProvider> ToolInvokingBackend<P> {
    /// Wraps a model provider.
    #[inline]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Limits how many rounds of tool calls one exchange may take.
    #[inline]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    fn model_request(
        request: &ChatRequest<'_>,
        produced: &[ChatMessage],
        with_tools: bool,
    ) -> ModelRequest {
        ModelRequest {
            messages: request
                .messages
                .iter()
                .chain(produced)
                .cloned()
                .collect(),
            tools: if with_tools {
                request.tools.definitions()
            } else {
                vec![]
            },
        }
    }
}

#[async_trait]
impl<P: ModelProvider + 'static> ChatBackend for ToolInvokingBackend<P> {
    async fn complete_streaming(
        &self,
        request: ChatRequest<'_>,
        on_update: &mut (dyn FnMut(ChatUpdate) + Send),
    ) -> Result<ChatResponse, BackendError> {
        let mut produced = Vec::new();

        for round in 0..=self.max_rounds {
            let with_tools = round < self.max_rounds && !request.tools.is_empty();
            if round == self.max_rounds {
                warn!("tool call limit reached, asking for a final answer");
            }
            let model_req = Self::model_request(&request, &produced, with_tools);
            debug!(
                "model round {round} with {} messages",
                model_req.messages.len()
            );

            let turn = send_request(&self.provider, model_req, &mut |delta| {
                on_update(ChatUpdate::TextDelta(delta.to_owned()))
            })
            .await?;

            let tool_calls = turn.message.tool_calls.clone();
            produced.push(ChatMessage::Assistant(turn.message));
            if tool_calls.is_empty() || !with_tools {
                return Ok(ChatResponse {
                    messages: produced,
                    finish_reason: turn.finish_reason,
                });
            }

            for call in tool_calls {
                info!("model called tool `{}` ({})", call.name, call.id);
                on_update(ChatUpdate::ToolCall(call.clone()));
                let result = request.tools.invoke(&call, request.cancel).await;
                on_update(ChatUpdate::ToolResult(result.clone()));
                produced.push(ChatMessage::Tool(result));
            }
        }

        unreachable!("the last round never offers tools")
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use debt_chat_model::{ChatRole, ModelFinishReason, ToolCallRequest};
    use debt_chat_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };
    use serde::Deserialize;
    use serde_json::{Value, json};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::tool::{Tool, ToolRegistry, ToolResult};

    #[derive(Deserialize)]
    struct NoInput {}

    struct DateTool(Value);

    impl Tool for DateTool {
        type Input = NoInput;

        fn name(&self) -> &str {
            "get_current_date"
        }

        fn description(&self) -> &str {
            "Returns the current date."
        }

        fn parameter_schema(&self) -> &Value {
            &self.0
        }

        fn execute(
            &self,
            _input: NoInput,
            _cancel: CancellationToken,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok("2025-06-15".to_owned()))
        }
    }

    fn date_call(id: &str) -> PresetEvent {
        PresetEvent::ToolCall(ToolCallRequest {
            id: id.to_owned(),
            name: "get_current_date".to_owned(),
            arguments: json!({}),
        })
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(DateTool(json!({ "type": "object" })));
        registry
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([date_call("call_1")]));
        provider.add_response(PresetResponse::with_deltas(["It is ", "June 15."]));
        let backend = ToolInvokingBackend::new(provider.clone());

        let history = vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("What day is it?"),
        ];
        let tools = registry();
        let cancel = CancellationToken::new();
        let mut updates = vec![];
        let response = backend
            .complete_streaming(
                ChatRequest {
                    messages: &history,
                    tools: &tools,
                    cancel: &cancel,
                },
                &mut |update| updates.push(update),
            )
            .await
            .unwrap();

        let roles: Vec<_> = response.messages.iter().map(|m| m.role()).collect();
        assert_eq!(
            roles,
            [ChatRole::Assistant, ChatRole::Tool, ChatRole::Assistant]
        );
        assert_eq!(response.messages[1].content(), "2025-06-15");
        assert_eq!(response.text(), "It is June 15.");
        assert_eq!(response.finish_reason, Some(ModelFinishReason::Stop));
        assert_eq!(updates.len(), 4);
        assert!(matches!(updates[0], ChatUpdate::ToolCall(_)));
        assert!(matches!(updates[1], ChatUpdate::ToolResult(_)));

        // The second request carries the tool turn back to the model.
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].messages[3].role(), ChatRole::Tool);
    }

    #[tokio::test]
    async fn test_round_limit_forces_answer() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([date_call("call_1")]));
        provider.add_response(PresetResponse::with_deltas(["Done."]));
        let backend = ToolInvokingBackend::new(provider.clone()).with_max_rounds(1);

        let history = vec![ChatMessage::user("Loop forever")];
        let tools = registry();
        let cancel = CancellationToken::new();
        let response = backend
            .complete(ChatRequest {
                messages: &history,
                tools: &tools,
                cancel: &cancel,
            })
            .await
            .unwrap();

        assert_eq!(response.text(), "Done.");
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = TestModelProvider::default();
        let backend = ToolInvokingBackend::new(provider);
        let history = vec![ChatMessage::user("Hi")];
        let tools = ToolRegistry::new();
        let cancel = CancellationToken::new();
        let result = backend
            .complete(ChatRequest {
                messages: &history,
                tools: &tools,
                cancel: &cancel,
            })
            .await;
        assert!(result.is_err());
    }
}
