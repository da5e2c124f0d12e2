use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use debt_chat_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, ToolCall};

/// Accumulated state of one streamed completion.
#[derive(Default)]
struct StreamState {
    // Tool calls arrive in fragments, keyed by their `index`.
    tool_calls: Vec<ToolCall>,
    finish_reason: Option<ModelFinishReason>,
}

impl StreamState {
    /// Applies a chunk and returns the text delta it carried, if any.
    fn apply(&mut self, mut chunk: ChatCompletionChunk) -> Option<String> {
        let choice = chunk.choices.pop()?;

        for tool_call in choice.delta.tool_calls.into_iter().flatten() {
            self.merge_tool_call(tool_call);
        }
        if let Some(reason) = choice.finish_reason {
            self.finish_reason = Some(match reason.as_str() {
                "tool_calls" | "function_call" => ModelFinishReason::ToolCalls,
                "length" => ModelFinishReason::Length,
                _ => ModelFinishReason::Stop,
            });
        }
        choice.delta.content.filter(|content| !content.is_empty())
    }

    fn merge_tool_call(&mut self, fragment: ToolCall) {
        let Some(partial) = self
            .tool_calls
            .iter_mut()
            .find(|t| t.index == fragment.index)
        else {
            self.tool_calls.push(fragment);
            return;
        };
        if let Some(id) = fragment.id {
            partial.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = fragment.r#type {
            partial.r#type = Some(ty);
        }
        let Some(function) = fragment.function else {
            return;
        };
        let partial_func = partial.function.get_or_insert_default();
        if let Some(name) = function.name {
            partial_func.name.get_or_insert_default().push_str(&name);
        }
        if let Some(arguments) = function.arguments {
            partial_func
                .arguments
                .get_or_insert_default()
                .push_str(&arguments);
        }
    }

    /// Drains the finished state into trailing events: every tool call in
    /// index order, then the finish reason.
    fn finish(&mut self) -> Vec<ModelResponseEvent> {
        let mut events: Vec<_> = self
            .tool_calls
            .drain(..)
            .map(|call| ModelResponseEvent::ToolCall(finish_tool_call(call)))
            .collect();
        if let Some(reason) = self.finish_reason.take() {
            events.push(ModelResponseEvent::Completed(reason));
        }
        events
    }
}

fn finish_tool_call(call: ToolCall) -> ToolCallRequest {
    let function = call.function.unwrap_or_default();
    let raw_arguments = function.arguments.unwrap_or_default();
    let arguments = if raw_arguments.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        // Leave malformed arguments as a string, the tool will reject them.
        serde_json::from_str(&raw_arguments)
            .unwrap_or(Value::String(raw_arguments))
    };
    ToolCallRequest {
        id: call.id.unwrap_or_default(),
        name: function.name.unwrap_or_default(),
        arguments,
    }
}

struct Stream {
    sse: Sse,
    state: StreamState,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvents = Result<(Vec<ModelResponseEvent>, Option<Stream>), Error>;

/// A streamed chat completion.
pub struct OpenAIResponse {
    next_events_fut: Option<PinnedFuture<NextEvents>>,
    pending_events: VecDeque<ModelResponseEvent>,
}

impl OpenAIResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let stream = Stream {
            sse,
            state: StreamState::default(),
        };
        Self {
            next_events_fut: Some(Box::pin(next_events(stream))),
            pending_events: VecDeque::new(),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        loop {
            if let Some(event) = this.pending_events.pop_front() {
                return Poll::Ready(Ok(Some(event)));
            }
            let Some(fut) = &mut this.next_events_fut else {
                return Poll::Ready(Ok(None));
            };
            let result = ready!(fut.as_mut().poll(cx));
            this.next_events_fut = None;
            let (events, stream) = result?;
            this.pending_events.extend(events);
            if let Some(stream) = stream {
                this.next_events_fut = Some(Box::pin(next_events(stream)));
            }
        }
    }
}

/// Reads the stream until it has something to report.
///
/// Returns `None` as the stream once the completion has finished.
async fn next_events(mut stream: Stream) -> NextEvents {
    loop {
        let data = match stream.sse.next_event().await {
            Ok(Some(data)) => data,
            Ok(None) => break,
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {data}");
        if data == "[DONE]" {
            break;
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&data)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        if let Some(delta) = stream.state.apply(chunk) {
            return Ok((vec![ModelResponseEvent::MessageDelta(delta)], Some(stream)));
        }
        if stream.state.finish_reason.is_some() {
            break;
        }
    }
    Ok((stream.state.finish(), None))
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::io::Chunks;

    const TOOL_CALL_STREAM: &[u8] = br#"data: {"id":"c1","choices":[{"delta":{"role":"assistant","content":"Let me "},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{"content":"check."},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_a","type":"function","function":{"name":"get_current_date","arguments":""}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{"tool_calls":[{"index":1,"id":"call_b","type":"function","function":{"name":"get_us_debt","arguments":"{\"page_"}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{"tool_calls":[{"index":1,"function":{"arguments":"size\": 1}"}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{},"finish_reason":"tool_calls"}]}

data: {"id":"c1","choices":[],"usage":{"prompt_tokens":10,"completion_tokens":5}}

data: [DONE]

"#;

    async fn collect(chunks: &[&'static [u8]]) -> Vec<ModelResponseEvent> {
        let chunks = Chunks::from_vec_deque(
            chunks.iter().map(|c| Bytes::from_static(*c)).collect(),
        );
        let mut resp = pin!(OpenAIResponse::from_sse(Sse::new(chunks)));
        let mut events = vec![];
        while let Some(event) = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap()
        {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_tool_call_events() {
        let events = collect(&[TOOL_CALL_STREAM]).await;
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("Let me ".to_owned()),
                ModelResponseEvent::MessageDelta("check.".to_owned()),
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "call_a".to_owned(),
                    name: "get_current_date".to_owned(),
                    arguments: json!({}),
                }),
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "call_b".to_owned(),
                    name: "get_us_debt".to_owned(),
                    arguments: json!({ "page_size": 1 }),
                }),
                ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
            ]
        );
    }

    #[tokio::test]
    async fn test_text_split_across_chunks() {
        let events = collect(&[
            b"data: {\"id\":\"c2\",\"choices\":[{\"delta\":{\"content\":\"Hel",
            b"lo\"},\"finish_reason\":null}]}\n\n",
            b"data: {\"id\":\"c2\",\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        ])
        .await;
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("Hello".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_chunk() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(b"data: {not json}\n\n")].into(),
        );
        let mut resp = pin!(OpenAIResponse::from_sse(Sse::new(chunks)));
        let result = poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await;
        assert!(result.is_err());
    }
}
