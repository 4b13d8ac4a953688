use super::{PostgrestError, Query, RestStore};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

/// HTTP client for a Supabase project's `/rest/v1` endpoint.
///
/// Every request carries the project `apikey` header and a bearer token:
/// the caller's access token when built with [`PostgrestClient::with_token`],
/// the anon key otherwise.
#[derive(Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
    bearer: String,
}

impl PostgrestClient {
    pub fn new(http: reqwest::Client, supabase_url: &str, api_key: &str) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            bearer: api_key.to_string(),
        }
    }

    pub fn with_token(&self, token: &str) -> Self {
        Self {
            bearer: token.to_string(),
            ..self.clone()
        }
    }

    pub fn table_url(&self, table: &str, query: &Query) -> String {
        let qs = query.to_query_string();
        if qs.is_empty() {
            format!("{}/{}", self.rest_url, table)
        } else {
            format!("{}/{}?{}", self.rest_url, table, qs)
        }
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    fn write_request(&self, method: Method, url: String) -> RequestBuilder {
        self.request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
    }
}

async fn check_status(resp: Response) -> Result<Response, PostgrestError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(PostgrestError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_array(table: &str, resp: Response) -> Result<Vec<Value>, PostgrestError> {
    let resp = check_status(resp).await?;
    match resp.json::<Value>().await? {
        Value::Array(rows) => Ok(rows),
        _ => Err(PostgrestError::Shape {
            table: table.to_string(),
        }),
    }
}

fn require_filter(table: &str, filter: &Query) -> Result<(), PostgrestError> {
    if filter.has_filters() {
        Ok(())
    } else {
        Err(PostgrestError::Encode(format!(
            "refusing unfiltered write to {table}"
        )))
    }
}

#[async_trait]
impl RestStore for PostgrestClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, PostgrestError> {
        let url = self.table_url(table, query);
        tracing::debug!("GET {}", url);
        let resp = self.request(Method::GET, url).send().await?;
        read_array(table, resp).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, PostgrestError> {
        let url = self.table_url(table, &Query::new());
        tracing::debug!("POST {}", url);
        let resp = self.write_request(Method::POST, url).json(&row).send().await?;
        read_array(table, resp).await
    }

    async fn update(
        &self,
        table: &str,
        filter: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, PostgrestError> {
        require_filter(table, filter)?;
        let url = self.table_url(table, filter);
        tracing::debug!("PATCH {}", url);
        let resp = self
            .write_request(Method::PATCH, url)
            .json(&patch)
            .send()
            .await?;
        read_array(table, resp).await
    }

    async fn delete(&self, table: &str, filter: &Query) -> Result<(), PostgrestError> {
        require_filter(table, filter)?;
        let url = self.table_url(table, filter);
        tracing::debug!("DELETE {}", url);
        let resp = self.request(Method::DELETE, url).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PostgrestClient {
        PostgrestClient::new(reqwest::Client::new(), "https://demo.supabase.co/", "anon")
    }

    #[test]
    fn table_url_joins_rest_path_and_query() {
        let c = client();
        assert_eq!(
            c.table_url("pto_balances", &Query::new()),
            "https://demo.supabase.co/rest/v1/pto_balances"
        );
        assert_eq!(
            c.table_url("pto_balances", &Query::new().eq("user_id", "u1")),
            "https://demo.supabase.co/rest/v1/pto_balances?user_id=eq.u1"
        );
    }

    #[tokio::test]
    async fn unfiltered_writes_are_refused() {
        let c = client();
        let err = c
            .update("pto_balances", &Query::new(), serde_json::json!({ "balance": 0 }))
            .await
            .unwrap_err();
        assert!(matches!(err, PostgrestError::Encode(_)));

        let err = c.delete("affiliates", &Query::new().select("*")).await.unwrap_err();
        assert!(matches!(err, PostgrestError::Encode(_)));
    }
}
