//! A client for the "Debt to the Penny" dataset of the U.S. Treasury
//! Fiscal Data API.

use std::sync::Arc;

use reqwest::Client;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::select;
use tokio_util::sync::CancellationToken;

/// The public Fiscal Data API host.
pub const DEFAULT_BASE_URL: &str = "https://api.fiscaldata.treasury.gov";

/// Path of the "Debt to the Penny" endpoint.
pub const DEBT_TO_PENNY_PATH: &str =
    "/services/api/fiscal_service/v2/accounting/od/debt_to_penny";

/// The largest page size the API accepts.
pub const MAX_PAGE_SIZE: u32 = 10_000;

const FIELDS: &str =
    "record_date,tot_pub_debt_out_amt,debt_held_public_amt,intragov_hold_amt";
const DEFAULT_SORT: &str = "-record_date";
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Parameters of one fetch. Unset values fall back to the API defaults
/// used by this client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct DebtQuery {
    /// Filter expression such as `record_date:gte:2024-01-01`.
    #[schemars(
        description = "Filter in `field:operator:value` form; join several with commas. Omit to fetch the latest records."
    )]
    #[serde(default)]
    pub filter: Option<String>,
    /// Sort field, descending with a leading `-`.
    #[schemars(
        description = "Field to sort by, prefix with `-` for descending. Defaults to `-record_date`."
    )]
    #[serde(default)]
    pub sort: Option<String>,
    /// 1-based page number.
    #[schemars(description = "1-based page number. Defaults to 1.")]
    #[serde(default)]
    pub page_number: Option<u32>,
    /// Records per page.
    #[schemars(
        description = "Records per page, between 1 and 10000. Defaults to 100."
    )]
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl DebtQuery {
    /// Returns the filter, or `None` if it is unset or blank.
    pub fn filter(&self) -> Option<&str> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
    }

    /// Returns the sort field, falling back to newest first.
    pub fn sort(&self) -> &str {
        self.sort
            .as_deref()
            .map(str::trim)
            .filter(|sort| !sort.is_empty())
            .unwrap_or(DEFAULT_SORT)
    }

    /// Returns the requested page, or the first one.
    #[inline]
    pub fn page_number(&self) -> u32 {
        self.page_number.unwrap_or(1).max(1)
    }

    /// Returns the page size, bounded to what the API accepts.
    #[inline]
    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Builds the query string sent to the API.
    ///
    /// Parameters always come in the same order and the page brackets are
    /// kept literal, so equal queries produce equal strings. The `:` and `,`
    /// of the filter syntax stay literal too, everything else in the
    /// filter and sort values is percent-encoded.
    pub fn to_query_string(&self) -> String {
        let mut query = format!("fields={FIELDS}");
        if let Some(filter) = self.filter() {
            query.push_str("&filter=");
            query.push_str(&encode_filter(filter));
        }
        query.push_str("&sort=");
        query.push_str(&urlencoding::encode(self.sort()));
        query.push_str(&format!(
            "&page[number]={}&page[size]={}",
            self.page_number(),
            self.page_size()
        ));
        query
    }
}

fn encode_filter(filter: &str) -> String {
    filter
        .split(',')
        .map(|condition| {
            condition
                .split(':')
                .map(urlencoding::encode)
                .collect::<Vec<_>>()
                .join(":")
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// One day of outstanding debt. Amounts are kept as the decimal strings
/// the API returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRecord {
    /// Date of the record, `YYYY-MM-DD`.
    pub record_date: String,
    /// Total public debt outstanding.
    pub tot_pub_debt_out_amt: String,
    /// Debt held by the public.
    pub debt_held_public_amt: String,
    /// Intragovernmental holdings.
    pub intragov_hold_amt: String,
}

/// Paging information of a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct PaginationMeta {
    /// Records in this page.
    pub count: u64,
    /// Records matching the query across all pages.
    #[serde(rename = "total-count")]
    pub total_count: u64,
    /// Pages available for the query.
    #[serde(rename = "total-pages")]
    pub total_pages: u64,
}

/// A decoded API response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DebtApiEnvelope {
    /// The records of the requested page.
    pub data: Vec<DebtRecord>,
    /// Paging information.
    pub meta: PaginationMeta,
}

/// Errors returned by [`FiscalDataClient::fetch`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent, or the API answered with an error
    /// status.
    #[error("request to the Fiscal Data API failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The API answered successfully but the body could not be decoded.
    #[error("unexpected response from the Fiscal Data API: {0}")]
    Protocol(#[from] serde_json::Error),
    /// The caller gave up before the response arrived.
    #[error("the request was cancelled")]
    Cancelled,
}

/// Fetches debt records from the Fiscal Data API.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct FiscalDataClient {
    client: Client,
    base_url: Arc<str>,
}

impl FiscalDataClient {
    /// Creates a client for the public API.
    #[inline]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client for another host serving the same API.
    #[inline]
    pub fn with_base_url<S: AsRef<str>>(base_url: S) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Creates a client sharing an existing HTTP client.
    pub fn with_client<S: AsRef<str>>(client: Client, base_url: S) -> Self {
        let base_url = base_url.as_ref().trim().trim_end_matches('/');
        let base_url = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Returns the host requests are sent to.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches one page of records matching `query`.
    pub async fn fetch(
        &self,
        query: &DebtQuery,
        cancel: &CancellationToken,
    ) -> Result<DebtApiEnvelope, FetchError> {
        let url = format!(
            "{}{DEBT_TO_PENNY_PATH}?{}",
            self.base_url,
            query.to_query_string()
        );
        debug!("fetching debt records: {query:?}");

        let request = async {
            let resp = self.client.get(&url).send().await?.error_for_status()?;
            let body = resp.bytes().await?;
            Ok::<_, FetchError>(serde_json::from_slice(&body)?)
        };
        let envelope: DebtApiEnvelope = select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = request => result?,
        };

        info!(
            "fetched {} debt records ({} total, {} pages)",
            envelope.data.len(),
            envelope.meta.total_count,
            envelope.meta.total_pages
        );
        Ok(envelope)
    }
}

impl Default for FiscalDataClient {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
