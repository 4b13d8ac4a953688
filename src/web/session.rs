use crate::db;
use crate::domain::models::User;
use crate::postgrest::PostgrestClient;
use crate::services::auth::AuthError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
};

/// Access token from `Authorization: Bearer ...` or the `session` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                let bearer = bearer.trim();
                if !bearer.is_empty() {
                    return Some(bearer.to_string());
                }
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                let trimmed = pair.trim();
                if let Some(rest) = trimmed.strip_prefix("session=") {
                    if !rest.is_empty() {
                        return Some(rest.to_string());
                    }
                }
            }
        }
    }
    None
}

/// Authenticated portal user plus a data client that acts with their token.
///
/// Usage:
/// ```ignore
/// async fn handler(session: UserSession) -> Result<...> {
///     let rows = db::playbook::load_templates(&session.rest).await;
/// }
/// ```
pub struct UserSession {
    pub user: User,
    pub rest: PostgrestClient,
}

impl UserSession {
    pub fn require_admin(&self) -> Result<(), StatusCode> {
        require_admin(&self.user)
    }
}

pub fn require_admin(user: &User) -> Result<(), StatusCode> {
    if user.is_admin() {
        Ok(())
    } else {
        tracing::warn!("User {} denied admin route", user.id);
        Err(StatusCode::FORBIDDEN)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
    crate::state::SharedState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = crate::state::SharedState::from_ref(state);

        let token = extract_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;

        let auth_user = shared_state.auth.user_for_token(&token).await.map_err(|e| {
            if matches!(e, AuthError::InvalidToken) {
                tracing::warn!("Session rejected: {}", e);
                StatusCode::UNAUTHORIZED
            } else {
                tracing::error!("Auth lookup failed: {}", e);
                StatusCode::BAD_GATEWAY
            }
        })?;

        let rest = shared_state.rest.with_token(&token);
        let user = db::find_user_by_id(&rest, auth_user.id).await.map_err(|e| {
            tracing::error!("User lookup failed for session {}: {}", auth_user.id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        let Some(user) = user else {
            tracing::warn!("Auth user {} has no portal profile", auth_user.id);
            return Err(StatusCode::UNAUTHORIZED);
        };

        Ok(UserSession { user, rest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UserRole;
    use axum::http::{header, HeaderValue};
    use uuid::Uuid;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=zzz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def"));

        headers.remove(header::AUTHORIZATION);
        assert_eq!(extract_token(&headers).as_deref(), Some("zzz"));
    }

    #[test]
    fn empty_tokens_are_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  "));
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn only_admins_pass_the_gate() {
        let mut user = User {
            id: Uuid::new_v4(),
            name: "Kim".into(),
            email: None,
            department: None,
            role: UserRole::Member,
            hire_date: None,
        };
        assert_eq!(require_admin(&user), Err(StatusCode::FORBIDDEN));
        user.role = UserRole::Admin;
        assert_eq!(require_admin(&user), Ok(()));
    }
}
