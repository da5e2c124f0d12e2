use debt_chat_core::{
    CancellationToken, ChatBackend, Error, Orchestrator, OrchestratorBuilder,
};
use debt_chat_model::{ChatMessage, ModelProvider, ToolDefinition};

use crate::fiscal_data::FiscalDataClient;
use crate::tools::*;

/// The default instructions given to the model.
pub const SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    orchestrator_builder: OrchestratorBuilder,
    system_prompt: String,
    date_tool: CurrentDateTool,
    fiscal_data: FiscalDataClient,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        Self::new(OrchestratorBuilder::with_model_provider(provider))
    }

    /// Creates a session builder with a specified chat backend.
    pub fn with_backend<B: ChatBackend + 'static>(backend: B) -> Self {
        Self::new(OrchestratorBuilder::with_backend(backend))
    }

    fn new(orchestrator_builder: OrchestratorBuilder) -> Self {
        Self {
            orchestrator_builder,
            system_prompt: SYSTEM_PROMPT.to_owned(),
            date_tool: CurrentDateTool::new(),
            fiscal_data: FiscalDataClient::new(),
        }
    }

    /// Replaces the default system prompt.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the clock the date tool reads.
    #[inline]
    pub fn with_clock<C: Clock>(mut self, clock: C) -> Self {
        self.date_tool = CurrentDateTool::with_clock(clock);
        self
    }

    /// Sets the client the debt tool fetches through.
    #[inline]
    pub fn with_fiscal_data_client(mut self, client: FiscalDataClient) -> Self {
        self.fiscal_data = client;
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        let orchestrator = self
            .orchestrator_builder
            .with_system_prompt(self.system_prompt)
            .with_tool(self.date_tool)
            .with_tool(DebtTool::new(self.fiscal_data))
            .build();

        Session { orchestrator }
    }
}

/// A chat session about U.S. public debt.
///
/// The session holds a fully configured orchestrator with the date and
/// debt tools, and is basically a wrapper around [`Orchestrator`].
pub struct Session {
    orchestrator: Orchestrator,
}

impl Session {
    /// Sends a message and waits for the complete answer.
    #[inline]
    pub async fn send_message(
        &mut self,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        self.orchestrator.send_message(message, cancel).await
    }

    /// Sends a message, handing each piece of the answer to `on_chunk` as
    /// it arrives.
    #[inline]
    pub async fn send_message_streaming<F>(
        &mut self,
        message: &str,
        cancel: &CancellationToken,
        on_chunk: F,
    ) -> Result<String, Error>
    where
        F: FnMut(&str) + Send,
    {
        self.orchestrator
            .send_message_streaming(message, cancel, on_chunk)
            .await
    }

    /// Starts over with an empty conversation.
    #[inline]
    pub fn reset(&mut self) {
        self.orchestrator.reset();
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn history(&self) -> &[ChatMessage] {
        self.orchestrator.history()
    }

    /// Returns the tools offered to the model.
    #[inline]
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.orchestrator.tool_definitions()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{DateTime, Utc};
    use debt_chat_model::{ChatRole, ToolCallRequest};
    use debt_chat_test_model::{PresetEvent, PresetResponse, TestModelProvider};
    use serde_json::{Value, json};

    use super::*;
    use crate::test_support::{SINGLE_RECORD_BODY, StubServer};

    fn tool_call(id: &str, name: &str, arguments: Value) -> PresetEvent {
        PresetEvent::ToolCall(ToolCallRequest {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments,
        })
    }

    fn session_for(provider: TestModelProvider, server: &StubServer) -> Session {
        SessionBuilder::with_model_provider(provider)
            .with_clock(|| "2025-06-15T14:30:00Z".parse::<DateTime<Utc>>().unwrap())
            .with_fiscal_data_client(FiscalDataClient::with_base_url(
                server.base_url(),
            ))
            .build()
    }

    #[tokio::test]
    async fn test_session_setup() {
        let server = StubServer::start(StatusCode::OK, SINGLE_RECORD_BODY).await;
        let session = session_for(TestModelProvider::default(), &server);

        let names: Vec<_> = session
            .tool_definitions()
            .into_iter()
            .map(|def| def.name)
            .collect();
        assert_eq!(names, ["get_current_date", "get_us_debt"]);

        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role(), ChatRole::System);
        assert!(session.history()[0].content().contains("1993-04-01"));
    }

    #[tokio::test]
    async fn test_answer_with_tools() {
        let server = StubServer::start(StatusCode::OK, SINGLE_RECORD_BODY).await;
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([tool_call(
            "call_1",
            "get_current_date",
            json!({}),
        )]));
        provider.add_response(PresetResponse::with_events([tool_call(
            "call_2",
            "get_us_debt",
            json!({ "filter": "record_date:eq:2024-12-31" }),
        )]));
        provider.add_response(PresetResponse::with_deltas([
            "The debt was ",
            "$36.22 trillion on December 31, 2024.",
        ]));
        let mut session = session_for(provider.clone(), &server);

        let answer = session
            .send_message("What was the debt at the end of 2024?", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(answer, "The debt was $36.22 trillion on December 31, 2024.");

        let history = session.history();
        let roles: Vec<_> = history.iter().map(|m| m.role()).collect();
        assert_eq!(
            roles,
            [
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::Tool,
                ChatRole::Assistant,
                ChatRole::Tool,
                ChatRole::Assistant,
            ]
        );
        assert_eq!(history[3].content(), "2025-06-15");
        let records: Value = serde_json::from_str(history[5].content()).unwrap();
        assert_eq!(records["pagination"]["returned"], 1);
        assert_eq!(server.queries().len(), 1);

        // Every request offers both tools.
        for request in provider.requests() {
            assert_eq!(request.tools.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_unavailable_data_reaches_model() {
        let server =
            StubServer::start(StatusCode::SERVICE_UNAVAILABLE, "down").await;
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([tool_call(
            "call_1",
            "get_us_debt",
            json!({ "page_size": 1 }),
        )]));
        provider.add_response(PresetResponse::with_deltas([
            "The data is temporarily unavailable.",
        ]));
        let mut session = session_for(provider, &server);

        let answer = session
            .send_message("What is the debt now?", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(answer, "The data is temporarily unavailable.");

        let tool_output: Value =
            serde_json::from_str(session.history()[3].content()).unwrap();
        assert_eq!(tool_output, json!({ "error": FETCH_FAILED_MESSAGE }));
    }
}
