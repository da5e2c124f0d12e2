use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::RawQuery;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;

use crate::fiscal_data::DEBT_TO_PENNY_PATH;

pub(crate) const SINGLE_RECORD_BODY: &str = r#"{
  "data": [
    {
      "record_date": "2024-12-31",
      "tot_pub_debt_out_amt": "36218605311689.11",
      "debt_held_public_amt": "28832737266311.48",
      "intragov_hold_amt": "7385868045377.63"
    }
  ],
  "meta": {
    "count": 1,
    "labels": {},
    "total-count": 1,
    "total-pages": 1
  },
  "links": {}
}"#;

/// A local stand-in for the Fiscal Data API answering every request with
/// the same status and body.
pub(crate) struct StubServer {
    base_url: String,
    queries: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub(crate) async fn start(status: StatusCode, body: &'static str) -> Self {
        let queries = Arc::new(Mutex::new(vec![]));
        let app = Router::new().route(
            DEBT_TO_PENNY_PATH,
            get({
                let queries = queries.clone();
                move |RawQuery(query): RawQuery| {
                    queries.lock().unwrap().push(query.unwrap_or_default());
                    async move { (status, body) }
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            queries,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw query strings received so far.
    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

/// Returns a base URL nothing listens on.
pub(crate) async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
