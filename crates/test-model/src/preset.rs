use debt_chat_model::{ErrorKind, ToolCallRequest};
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failures: None,
        }
    }

    /// Creates a `PresetResponse` that streams the given text deltas.
    pub fn with_deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            deltas
                .into_iter()
                .map(|d| PresetEvent::MessageDelta(d.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    pub(crate) fn has_tool_call(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)))
    }

    /// Consumes one scheduled failure, returning whether this attempt fails.
    pub(crate) fn take_failure(&mut self) -> Option<ErrorKind> {
        match self.failures {
            None => None,
            Some(0) => Some(ErrorKind::Other),
            Some(1) => {
                self.failures = None;
                Some(ErrorKind::RateLimitExceeded)
            }
            Some(n) => {
                self.failures = Some(n - 1);
                Some(ErrorKind::RateLimitExceeded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::MessageDelta("Let me look that up.".to_string()),
            PresetEvent::ToolCall(ToolCallRequest {
                id: "1".to_string(),
                name: "get_us_debt".to_string(),
                arguments: json!({ "filter": "record_date:eq:2024-12-31" }),
            }),
        ]);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
        assert!(deserialized.has_tool_call());
    }

    #[test]
    fn test_take_failure() {
        let mut response =
            PresetResponse::with_deltas(["ok"]).with_failures(2);
        assert_eq!(response.take_failure(), Some(ErrorKind::RateLimitExceeded));
        assert_eq!(response.take_failure(), Some(ErrorKind::RateLimitExceeded));
        assert_eq!(response.take_failure(), None);

        let mut response =
            PresetResponse::with_deltas(["never"]).with_failures(0);
        for _ in 0..3 {
            assert_eq!(response.take_failure(), Some(ErrorKind::Other));
        }
    }
}
