use std::future::poll_fn;
use std::pin::pin;

use debt_chat_model::{
    AssistantMessage, ModelFinishReason, ModelProvider, ModelRequest,
    ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

use crate::error::BackendError;

/// A completely received model turn.
#[derive(Clone, Debug)]
pub struct ModelTurn {
    pub message: AssistantMessage,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

/// Sends a request to the provider and drives its response to completion,
/// reporting every text delta as it arrives.
///
/// # Cancel safety
///
/// This function is cancel safe. The response stops streaming further
/// events when the returned future is dropped.
pub async fn send_request<P: ModelProvider>(
    provider: &P,
    req: ModelRequest,
    on_delta: &mut (dyn FnMut(&str) + Send),
) -> Result<ModelTurn, BackendError> {
    let fut = provider.send_request(&req);
    async move {
        trace!("got a request: {req:?}");
        let resp = fut.await.map_err(|err| {
            error!("got an error: {err:?}");
            BackendError::from_provider(err)
        })?;
        collect_turn(resp, on_delta).await
    }
    .instrument(trace_span!("model client req"))
    .await
}

async fn collect_turn<R: ModelResponse>(
    resp: R,
    on_delta: &mut (dyn FnMut(&str) + Send),
) -> Result<ModelTurn, BackendError> {
    let mut message = AssistantMessage::default();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    while let Some(event) =
        poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx))
            .await
            .map_err(|err| {
                error!("got an error: {err:?}");
                BackendError::from_provider(err)
            })?
    {
        trace!("got an event: {event:?}");
        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                message.content.push_str(&delta);
                on_delta(&delta);
            }
            ModelResponseEvent::ToolCall(req) => {
                message.tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelTurn {
        message,
        finish_reason,
    })
}
