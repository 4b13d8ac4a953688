use crate::analytics::sales::doo_bonus;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    #[error("finance proxy transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("finance proxy returned HTTP {0}")]
    Status(u16),
    #[error("finance proxy error: {0}")]
    Upstream(String),
    #[error("finance proxy response missing {0}")]
    Missing(&'static str),
}

/// Client for the hosted QuickBooks proxy (`/status`, `/data`, `/refresh`,
/// `/auth`). Any JSON body carrying a non-null `error` field is a failure.
#[derive(Clone)]
pub struct FinanceClient {
    http: reqwest::Client,
    base_url: String,
}

impl FinanceClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn call(&self, method: Method, path: &str) -> Result<Value, FinanceError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);
        let resp = self.http.request(method, url).send().await?;
        let status = resp.status();
        let body: Value = match resp.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(FinanceError::Status(status.as_u16())),
            Err(e) => return Err(FinanceError::Transport(e)),
        };
        check_error_sentinel(body, status.as_u16())
    }

    pub async fn status(&self) -> Result<Value, FinanceError> {
        self.call(Method::GET, "/status").await
    }

    pub async fn data(&self) -> Result<Value, FinanceError> {
        self.call(Method::GET, "/data").await
    }

    pub async fn refresh(&self) -> Result<Value, FinanceError> {
        self.call(Method::POST, "/refresh").await
    }

    pub async fn auth_url(&self) -> Result<String, FinanceError> {
        let body = self.call(Method::GET, "/auth").await?;
        ["url", "auth_url", "authUrl"]
            .iter()
            .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .ok_or(FinanceError::Missing("auth url"))
    }
}

fn check_error_sentinel(body: Value, status: u16) -> Result<Value, FinanceError> {
    match body.get("error") {
        Some(Value::Null) | None => {}
        Some(Value::String(message)) => return Err(FinanceError::Upstream(message.clone())),
        Some(other) => return Err(FinanceError::Upstream(other.to_string())),
    }
    if !(200..300).contains(&status) {
        return Err(FinanceError::Status(status));
    }
    Ok(body)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FinancialSummary {
    pub revenue: f64,
    pub expenses: f64,
    pub net_profit: f64,
    pub doo_bonus: f64,
    pub doo_bonus_percent: f64,
}

fn number_at(data: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let value = data.get(*key)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.replace(',', "").parse().ok()))
    })
}

/// Pulls headline numbers out of the proxy's profit-and-loss payload. Net
/// profit falls back to revenue minus expenses when not reported.
pub fn summarize(data: &Value, doo_bonus_percent: f64) -> FinancialSummary {
    let scope = data.get("summary").unwrap_or(data);
    let revenue = number_at(scope, &["revenue", "total_income", "income"]).unwrap_or(0.0);
    let expenses = number_at(scope, &["expenses", "total_expenses"]).unwrap_or(0.0);
    let net_profit = number_at(scope, &["net_profit", "net_income"]).unwrap_or(revenue - expenses);

    FinancialSummary {
        revenue,
        expenses,
        net_profit,
        doo_bonus: doo_bonus(net_profit, doo_bonus_percent),
        doo_bonus_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_sentinel_wins_over_status() {
        let err = check_error_sentinel(json!({ "error": "token expired" }), 200).unwrap_err();
        assert!(matches!(err, FinanceError::Upstream(ref m) if m == "token expired"));
        assert!(check_error_sentinel(json!({ "error": null, "ok": true }), 200).is_ok());
        assert!(matches!(
            check_error_sentinel(json!({}), 502),
            Err(FinanceError::Status(502))
        ));
    }

    #[test]
    fn summary_reads_nested_or_flat_payloads() {
        let nested = json!({ "summary": { "total_income": "120,000.50", "total_expenses": 80000.5 } });
        let s = summarize(&nested, 5.0);
        assert_eq!(s.revenue, 120000.5);
        assert_eq!(s.net_profit, 40000.0);
        assert_eq!(s.doo_bonus, 2000.0);

        let flat = json!({ "revenue": 1000, "expenses": 1500, "net_income": -500 });
        let s = summarize(&flat, 5.0);
        assert_eq!(s.net_profit, -500.0);
        assert_eq!(s.doo_bonus, 0.0);
    }
}
