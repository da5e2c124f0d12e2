use debt_chat_core::CancellationToken;
use debt_chat_core::tool::{Tool, ToolResult};
use schemars::schema_for;
use serde::Serialize;
use serde_json::{Value, json};

use crate::fiscal_data::{
    DebtApiEnvelope, DebtQuery, DebtRecord, FetchError, FiscalDataClient,
};

/// The message returned to the model when debt data could not be fetched.
pub const FETCH_FAILED_MESSAGE: &str = "Unable to fetch debt data from the U.S. Treasury Fiscal Data API right now. Tell the user the data is temporarily unavailable and suggest trying again later.";

#[derive(Serialize)]
struct DebtToolOutput<'a> {
    records: &'a [DebtRecord],
    pagination: Pagination,
}

#[derive(Serialize)]
struct Pagination {
    returned: usize,
    total_records: u64,
    total_pages: u64,
    current_page: u32,
}

/// A tool looking up U.S. public debt records.
///
/// Failures never reach the model as tool errors. They are reported as a
/// JSON object with a single `error` key instead.
pub struct DebtTool {
    client: FiscalDataClient,
    parameter_schema: Value,
}

impl DebtTool {
    /// Creates a debt tool fetching through `client`.
    pub fn new(client: FiscalDataClient) -> Self {
        DebtTool {
            client,
            parameter_schema: schema_for!(DebtQuery).to_value(),
        }
    }

    /// Fetches the records matching `query` and renders them as the JSON
    /// text handed to the model.
    pub async fn fetch_debt(
        &self,
        query: &DebtQuery,
        cancel: &CancellationToken,
    ) -> String {
        fetch_debt(&self.client, query, cancel).await
    }
}

impl Default for DebtTool {
    #[inline]
    fn default() -> Self {
        Self::new(FiscalDataClient::new())
    }
}

impl Tool for DebtTool {
    type Input = DebtQuery;

    fn name(&self) -> &str {
        "get_us_debt"
    }

    fn description(&self) -> &str {
        r#"
Fetches daily U.S. public debt records from the Treasury "Debt to the Penny" dataset. Data starts on 1993-04-01; there are no records before that date, and none for weekends or federal holidays.
Each record has `record_date` (YYYY-MM-DD), `tot_pub_debt_out_amt` (total public debt outstanding), `debt_held_public_amt` (debt held by the public) and `intragov_hold_amt` (intragovernmental holdings). Amounts are U.S. dollars as decimal strings.
The result is JSON: {"records": [...], "pagination": {"returned", "total_records", "total_pages", "current_page"}}. If it is {"error": "..."} instead, the data is unavailable; do not guess numbers.

Parameters (all optional):
- filter: `field:operator:value`. Join several conditions with commas; all must hold. Operators: `eq` (equal), `lt` (less than), `lte` (less than or equal), `gt` (greater than), `gte` (greater than or equal), `in` (one of a parenthesized list).
- sort: field name, prefix with `-` for descending. Default `-record_date` (newest first).
- page_number: 1-based page. Default 1.
- page_size: records per page, 1 to 10000. Default 100.

Examples:
- Latest record: page_size=1 and no filter.
- A specific day: filter=record_date:eq:2024-12-31
- A date range: filter=record_date:gte:2024-01-01,record_date:lte:2024-01-31
- Several days: filter=record_date:in:(2023-12-29,2024-12-31)
- First record of a year: filter=record_date:gte:2020-01-01, sort=record_date, page_size=1
- Last record of a year: filter=record_date:lte:2020-12-31, sort=-record_date, page_size=1
When the exact date may have no record, query a small range around it instead of a single day."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: DebtQuery,
        cancel: CancellationToken,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        async move { Ok(fetch_debt(&client, &input, &cancel).await) }
    }
}

async fn fetch_debt(
    client: &FiscalDataClient,
    query: &DebtQuery,
    cancel: &CancellationToken,
) -> String {
    match client.fetch(query, cancel).await {
        Ok(envelope) => render_records(&envelope, query.page_number()),
        Err(err) => {
            match &err {
                FetchError::Transport(_) => warn!("debt fetch failed: {err}"),
                FetchError::Protocol(_) => {
                    warn!("debt fetch returned an unreadable body: {err}")
                }
                FetchError::Cancelled => debug!("debt fetch cancelled"),
            }
            error_payload()
        }
    }
}

fn render_records(envelope: &DebtApiEnvelope, current_page: u32) -> String {
    let output = DebtToolOutput {
        records: &envelope.data,
        pagination: Pagination {
            returned: envelope.data.len(),
            total_records: envelope.meta.total_count,
            total_pages: envelope.meta.total_pages,
            current_page,
        },
    };
    serde_json::to_string(&output).unwrap_or_else(|err| {
        error!("failed to serialize debt records: {err}");
        error_payload()
    })
}

#[inline]
fn error_payload() -> String {
    json!({ "error": FETCH_FAILED_MESSAGE }).to_string()
}
