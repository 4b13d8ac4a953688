use crate::config::Config;
use crate::postgrest::PostgrestClient;
use crate::services::auth::SupabaseAuth;
use crate::services::finance::FinanceClient;
use crate::services::payments::PaymentsCache;
use crate::time_utils;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<Config>,
    /// Anonymous-key client; sessions derive a per-user client from it.
    pub rest: PostgrestClient,
    pub auth: SupabaseAuth,
    pub finance: Option<FinanceClient>,
    pub payments: PaymentsCache,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        let rest = PostgrestClient::new(http.clone(), &config.supabase_url, &config.supabase_anon_key);
        let auth = SupabaseAuth::new(http.clone(), &config.supabase_url, &config.supabase_anon_key);
        let finance = config
            .quickbooks_proxy_url
            .as_deref()
            .map(|url| FinanceClient::new(http, url));
        Self {
            config: Arc::new(config),
            rest,
            auth,
            finance,
            payments: PaymentsCache::new(),
        }
    }

    /// Calendar date in the portal's time zone.
    pub fn today(&self) -> NaiveDate {
        time_utils::local_today(&self.config.timezone)
    }
}
