use std::future::ready;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use debt_chat_core::CancellationToken;
use debt_chat_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// A source of the current time.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
{
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct CurrentDateParameters {}

/// A tool telling the model today's date, so relative dates like
/// "last month" can be resolved.
pub struct CurrentDateTool {
    clock: Arc<dyn Clock>,
    parameter_schema: Value,
}

impl CurrentDateTool {
    /// Creates a date tool reading the system clock.
    #[inline]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates a date tool reading the given clock.
    pub fn with_clock<C: Clock>(clock: C) -> Self {
        CurrentDateTool {
            clock: Arc::new(clock),
            parameter_schema: schema_for!(CurrentDateParameters).to_value(),
        }
    }

    /// Returns today's UTC date as `YYYY-MM-DD`.
    pub fn current_date(&self) -> String {
        self.clock.now().format("%Y-%m-%d").to_string()
    }
}

impl Default for CurrentDateTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CurrentDateTool {
    type Input = CurrentDateParameters;

    fn name(&self) -> &str {
        "get_current_date"
    }

    fn description(&self) -> &str {
        r#"
Returns today's date in UTC, formatted as YYYY-MM-DD (for example 2025-06-15).
Takes no parameters.
Call this before answering any question with a relative date such as "today", "yesterday", "last month", "this year" or "five years ago", then compute the absolute dates from the result."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        _input: CurrentDateParameters,
        _cancel: CancellationToken,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let date = self.current_date();
        trace!("current date is {date}");
        ready(Ok(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_clock() -> impl Clock {
        || "2025-06-15T14:30:00Z".parse::<DateTime<Utc>>().unwrap()
    }

    #[test]
    fn test_current_date_uses_clock() {
        let tool = CurrentDateTool::with_clock(fixed_clock());
        assert_eq!(tool.current_date(), "2025-06-15");
    }

    #[test]
    fn test_date_is_utc() {
        let tool = CurrentDateTool::with_clock(|| {
            "2025-06-15T23:30:00-05:00"
                .parse::<DateTime<Utc>>()
                .unwrap()
        });
        assert_eq!(tool.current_date(), "2025-06-16");
    }

    #[tokio::test]
    async fn test_execute_returns_date() {
        let tool = CurrentDateTool::with_clock(fixed_clock());
        let output = tool
            .execute(CurrentDateParameters {}, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output, "2025-06-15");
        assert_eq!(tool.parameter_schema()["type"], "object");
    }
}
