pub mod client;
#[cfg(test)]
pub mod memory;
pub mod query;

pub use client::PostgrestClient;
pub use query::{Direction, Query};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum PostgrestError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response shape from {table}: expected a JSON array")]
    Shape { table: String },
    #[error("failed to decode {table} row: {message}")]
    Decode { table: String, message: String },
    #[error("encode error: {0}")]
    Encode(String),
}

/// Row-level access to the hosted data API.
///
/// Every operation addresses a table by name and takes PostgREST filter
/// semantics; writes return the affected rows.
#[async_trait]
pub trait RestStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, PostgrestError>;
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, PostgrestError>;
    async fn update(
        &self,
        table: &str,
        filter: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, PostgrestError>;
    async fn delete(&self, table: &str, filter: &Query) -> Result<(), PostgrestError>;
}

pub async fn fetch_rows<T: DeserializeOwned>(
    store: &dyn RestStore,
    table: &str,
    query: &Query,
) -> Result<Vec<T>, PostgrestError> {
    let rows = store.select(table, query).await?;
    decode_rows(table, rows)
}

pub async fn fetch_one<T: DeserializeOwned>(
    store: &dyn RestStore,
    table: &str,
    query: Query,
) -> Result<Option<T>, PostgrestError> {
    let rows = store.select(table, &query.limit(1)).await?;
    Ok(decode_rows(table, rows)?.into_iter().next())
}

pub async fn insert_row<T: DeserializeOwned, B: Serialize>(
    store: &dyn RestStore,
    table: &str,
    body: &B,
) -> Result<T, PostgrestError> {
    let value = serde_json::to_value(body).map_err(|e| PostgrestError::Encode(e.to_string()))?;
    let rows = store.insert(table, value).await?;
    decode_rows(table, rows)?
        .into_iter()
        .next()
        .ok_or_else(|| PostgrestError::Shape {
            table: table.to_string(),
        })
}

pub async fn update_rows<T: DeserializeOwned, B: Serialize>(
    store: &dyn RestStore,
    table: &str,
    filter: &Query,
    body: &B,
) -> Result<Vec<T>, PostgrestError> {
    let value = serde_json::to_value(body).map_err(|e| PostgrestError::Encode(e.to_string()))?;
    let rows = store.update(table, filter, value).await?;
    decode_rows(table, rows)
}

fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>, PostgrestError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| PostgrestError::Decode {
                table: table.to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}
