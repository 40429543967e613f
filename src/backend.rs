use crate::error::{BackendError, ConfigError};
use crate::schema::RowRecord;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// Remote table that accepts batches of rows.
///
/// One call is one request: the rows are committed together or the call
/// reports the backend's error message.
#[async_trait]
pub trait TableClient: Send + Sync {
    async fn insert(&self, table: &str, rows: &[RowRecord]) -> Result<(), BackendError>;
}

/// Insert-many client for a hosted PostgREST backend (Supabase).
#[derive(Clone, Debug)]
pub struct RestTableClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl RestTableClient {
    pub fn new(base_url: Url, api_key: String, timeout: Duration) -> Result<Self, ConfigError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(RestTableClient {
            http,
            base_url,
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/rest/v1/{}", base, table))
            .map_err(|e| BackendError::new(format!("invalid table URL: {}", e)))
    }
}

#[async_trait]
impl TableClient for RestTableClient {
    async fn insert(&self, table: &str, rows: &[RowRecord]) -> Result<(), BackendError> {
        let url = self.table_url(table)?;
        debug!("POST {} ({} rows)", url, rows.len());

        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::new(error_message(status, &body)))
    }
}

/// The `message` field of a JSON error body, else the raw body, else the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorBody {
        message: Some(message),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        return message;
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status.to_string()
}
