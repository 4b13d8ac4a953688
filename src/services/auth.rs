use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid or expired access token")]
    InvalidToken,
    #[error("auth service returned HTTP {0}")]
    Upstream(u16),
    #[error("auth transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Resolves Supabase access tokens to auth users via `/auth/v1/user`.
#[derive(Clone)]
pub struct SupabaseAuth {
    http: reqwest::Client,
    auth_url: String,
    api_key: String,
}

impl SupabaseAuth {
    pub fn new(http: reqwest::Client, supabase_url: &str, api_key: &str) -> Self {
        Self {
            http,
            auth_url: format!("{}/auth/v1", supabase_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    pub async fn user_for_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let resp = self
            .http
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            return Err(AuthError::Upstream(status.as_u16()));
        }
        Ok(resp.json::<AuthUser>().await?)
    }
}
