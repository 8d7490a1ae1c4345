//! Supabase / PostgREST backend for the `pills` and `medication_records` tables.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use super::repository::format_timestamp;
use super::store::{CatalogStore, RecordStore};
use super::StoreError;
use crate::models::{CatalogEntry, MedicationRecord, RecordWithPill};

/// Embedded catalog columns requested alongside each record.
const RECORD_SELECT: &str = "*,pills(name,manufacturer,dosage,description)";

/// Characters that must be double-quoted inside a PostgREST filter value.
const RESERVED: &[char] = &[',', '.', ':', '(', ')', '{', '}', '"', '\\', ' '];

/// PostgREST HTTP client.
pub struct PostgrestStore {
    base_url: String,
    api_key: String,
    bearer: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct InsertedRow {
    id: Uuid,
}

#[derive(Deserialize)]
struct PostgrestErrorBody {
    message: String,
}

impl PostgrestStore {
    /// Client for the project at `base_url` using the anon key for both the
    /// `apikey` header and the bearer token.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bearer: api_key.to_string(),
            client,
        })
    }

    /// Send requests as a signed-in user so row-level security applies.
    pub fn with_access_token(mut self, token: &str) -> Self {
        self.bearer = token.to_string();
        self
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))
    }
}

/// Filter for "name contains `term` (case-insensitive) or keywords contain `term`".
pub fn catalog_filter(term: &str) -> String {
    let pattern = quote_value(&format!("*{term}*"));
    let keyword = quote_value(term);
    format!("(name.ilike.{pattern},keywords.cs.{{{keyword}}})")
}

fn quote_value(value: &str) -> String {
    if value.contains(RESERVED) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

// PostgREST error bodies are JSON with a `message`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<PostgrestErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl CatalogStore for PostgrestStore {
    async fn search_pills(&self, term: &str) -> Result<Vec<CatalogEntry>, StoreError> {
        let request = self
            .request(Method::GET, "pills")
            .query(&[("select", "*".to_string()), ("or", catalog_filter(term))]);
        self.fetch(request).await
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn insert_record(&self, record: &MedicationRecord) -> Result<Uuid, StoreError> {
        let request = self
            .request(Method::POST, "medication_records")
            .header("Prefer", "return=representation")
            .json(&[record]);

        let rows: Vec<InsertedRow> = self.fetch(request).await.map_err(|e| match e {
            StoreError::Status { status, body } => {
                StoreError::Write(format!("{status}: {}", error_message(&body)))
            }
            other => other,
        })?;

        rows.first()
            .map(|row| row.id)
            .ok_or_else(|| StoreError::Write("insert returned no rows".into()))
    }

    async fn records_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RecordWithPill>, StoreError> {
        let request = self.request(Method::GET, "medication_records").query(&[
            ("select", RECORD_SELECT.to_string()),
            ("taken_at", format!("gte.{}", format_timestamp(&start))),
            ("taken_at", format!("lt.{}", format_timestamp(&end))),
            ("order", "taken_at.desc".to_string()),
        ]);
        self.fetch(request).await
    }

    async fn recent_records(&self, limit: usize) -> Result<Vec<RecordWithPill>, StoreError> {
        let request = self.request(Method::GET, "medication_records").query(&[
            ("select", RECORD_SELECT.to_string()),
            ("order", "taken_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]);
        self.fetch(request).await
    }
}
