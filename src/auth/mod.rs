//! Cookie-based session authentication.
//!
//! The session cookie holds `<session id>.<secret>`. Only a SHA-256 hash of
//! the secret is stored, and it is compared in constant time.

pub mod password;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::errors::AppError;
use crate::models::User;
use crate::AppState;

use password::{generate_secret, hash_secret, secret_matches};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "pantry_session";

/// The authenticated user, inserted into request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Reject requests without a valid session; otherwise attach the [`CurrentUser`].
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let value = session_cookie(headers).ok_or(AppError::Unauthorized)?;
    let (session_id, secret) = value.split_once('.').ok_or(AppError::Unauthorized)?;

    let record = state
        .repo
        .get_session(session_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if record.expires_at <= Utc::now() {
        tracing::debug!(session_id = %session_id, "Session expired");
        state.repo.delete_session(session_id).await?;
        return Err(AppError::Unauthorized);
    }
    if !secret_matches(secret, &record.token_hash) {
        tracing::warn!(session_id = %session_id, "Session secret mismatch");
        return Err(AppError::Unauthorized);
    }
    Ok(record.user)
}

/// Value of the session cookie, if the request carries one.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Create a session for the user and return the `Set-Cookie` header value.
pub async fn start_session(state: &AppState, user_id: &str) -> Result<String, AppError> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let secret = generate_secret();
    let ttl_hours = state.config.session_ttl_hours;

    state
        .repo
        .create_session(&session_id, user_id, &hash_secret(&secret), ttl_hours)
        .await?;

    tracing::info!(user_id = %user_id, "Session started");
    Ok(session_set_cookie(
        &format!("{}.{}", session_id, secret),
        ttl_hours * 3600,
        state.config.cookie_secure,
    ))
}

/// End the session named by the request's cookie, if any.
pub async fn end_session(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if let Some(value) = session_cookie(headers) {
        let session_id = value.split_once('.').map(|(id, _)| id).unwrap_or(value.as_str());
        state.repo.delete_session(session_id).await?;
    }
    Ok(())
}

pub fn session_set_cookie(value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_set_cookie("", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; pantry_session=abc.def; lang=en"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        let mut headers = HeaderMap::new();
        assert!(session_cookie(&headers).is_none());
        headers.insert(header::COOKIE, HeaderValue::from_static("pantry_session="));
        assert!(session_cookie(&headers).is_none());
    }

    #[test]
    fn test_set_cookie_attributes() {
        let cookie = session_set_cookie("id.secret", 3600, true);
        assert!(cookie.starts_with("pantry_session=id.secret;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));

        let cleared = clear_session_cookie(false);
        assert!(cleared.contains("Max-Age=0"));
        assert!(!cleared.contains("Secure"));
    }
}
