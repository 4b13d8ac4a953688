use anyhow::{anyhow, Result};
use std::time::Duration;

const DEFAULT_TIMEZONE: &str = "America/New_York";
const DEFAULT_DOO_BONUS_PERCENT: f64 = 5.0;
// Every two minutes, on the minute.
const DEFAULT_PAYMENTS_REFRESH_CRON: &str = "0 */2 * * * *";

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub quickbooks_proxy_url: Option<String>,
    pub crm_dashboard_url: Option<String>,
    pub timezone: String,
    pub payments_refresh_cron: String,
    pub doo_bonus_percent: f64,
    pub http_timeout: Duration,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{key} missing"))
        };
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timezone = match optional("PORTAL_TIMEZONE") {
            Some(raw) => crate::time_utils::normalize_timezone(&raw)
                .ok_or_else(|| anyhow!("PORTAL_TIMEZONE is not a known timezone: {raw}"))?,
            None => DEFAULT_TIMEZONE.to_string(),
        };

        let http_timeout = match optional("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .map_err(|_| anyhow!("HTTP_TIMEOUT_SECS must be a number of seconds"))?,
            ),
            None => Duration::from_secs(15),
        };

        let doo_bonus_percent = match optional("DOO_BONUS_PERCENT") {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite() && *p >= 0.0)
                .ok_or_else(|| anyhow!("DOO_BONUS_PERCENT must be a non-negative number"))?,
            None => DEFAULT_DOO_BONUS_PERCENT,
        };

        let bind_addr = optional("BIND_ADDR").unwrap_or_else(|| {
            let port = optional("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        Ok(Self {
            supabase_url: required("SUPABASE_URL")?,
            supabase_anon_key: required("SUPABASE_ANON_KEY")?,
            quickbooks_proxy_url: optional("QUICKBOOKS_PROXY_URL"),
            crm_dashboard_url: optional("POINTSCRM_DASHBOARD_URL"),
            timezone,
            payments_refresh_cron: optional("PAYMENTS_REFRESH_CRON")
                .unwrap_or_else(|| DEFAULT_PAYMENTS_REFRESH_CRON.to_string()),
            doo_bonus_percent,
            http_timeout,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(config.timezone, "America/New_York");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.quickbooks_proxy_url.is_none());
    }

    #[test]
    fn missing_required_var_is_named() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_URL", "https://demo.supabase.co")]))
            .unwrap_err();
        assert!(err.to_string().contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("PORTAL_TIMEZONE", "Mars/Olympus"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORTAL_TIMEZONE"));
    }

    #[test]
    fn port_feeds_bind_addr() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("PORT", "8080"),
            ("QUICKBOOKS_PROXY_URL", "  "),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.quickbooks_proxy_url.is_none());
    }
}
