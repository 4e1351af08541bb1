use std::sync::Arc;

use reqwest::header::{HeaderMap, SET_COOKIE};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::management::store::{StoreError, TokenStore};

/// Storage key of the session (access) token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Name of the HTTP-only cookie carrying the long-lived refresh credential.
/// The same name is used as its storage key.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Owns the client's credentials for the lifetime of a session.
///
/// Constructed once at startup over a [`TokenStore`] and shared by every
/// request the client issues. Besides the token itself it holds the refresh
/// lock that serializes concurrent refresh attempts.
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        SessionManager {
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.store
            .get(ACCESS_TOKEN_KEY)
            .await
            .filter(|t| !t.is_empty())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.access_token().await.is_some()
    }

    /// Replaces the stored session token.
    pub async fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, token).await
    }

    pub async fn clear_access_token(&self) -> Result<(), StoreError> {
        self.store.remove(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_credential(&self) -> Option<String> {
        self.store
            .get(REFRESH_COOKIE)
            .await
            .filter(|c| !c.is_empty())
    }

    /// `Cookie` header value to send with outbound requests, if any.
    pub async fn cookie_header(&self) -> Option<String> {
        self.refresh_credential()
            .await
            .map(|value| format!("{}={}", REFRESH_COOKIE, value))
    }

    /// Captures the refresh cookie from a response's `Set-Cookie` headers.
    ///
    /// An empty cookie value deletes the stored credential. Storage failures
    /// are logged and otherwise ignored; the response itself is still valid.
    pub async fn record_set_cookies(&self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            let Some(cookie) = parse_refresh_cookie(raw) else {
                continue;
            };

            let result = if cookie.is_empty() {
                self.store.remove(REFRESH_COOKIE).await
            } else {
                self.store.set(REFRESH_COOKIE, &cookie).await
            };

            match result {
                Ok(()) => debug!("refresh credential updated"),
                Err(e) => warn!("failed to store refresh credential: {}", e),
            }
        }
    }

    /// Ends the session: forgets the token and the refresh credential.
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        self.store.remove(REFRESH_COOKIE).await
    }

    /// Waits for any in-flight refresh and blocks others until dropped.
    pub async fn refresh_guard(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

/// Extracts the refresh cookie value from one `Set-Cookie` header.
///
/// Returns `None` when the header sets some other cookie.
pub fn parse_refresh_cookie(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    if name.trim() != REFRESH_COOKIE {
        return None;
    }
    Some(value.trim().trim_matches('"').to_string())
}
