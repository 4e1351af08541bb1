//! Authenticated API client.
//!
//! [`AuthClient`] decorates a [`Transport`] with the session token and
//! recovers from access-token expiry by refreshing exactly once per request.
//!
//! Per request the client walks this state machine:
//!
//! ```text
//! Initial --(non-401)--> Done
//! Initial --(401, not yet retried)--> Refreshing --(ok)--> Retried --> Done / error
//!                                                \--(fail)--> LoggedOut
//! Initial --(401, already retried)--> error
//! ```
//!
//! There is no edge from `Retried` back to `Refreshing`.

use std::{fmt, sync::Arc};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::{
    management::SessionManager,
    shortener::{
        error::ApiError,
        transport::{ApiRequest, ApiResponse, Transport},
    },
};

/// Path of the refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: [&str; 2] = ["auth", "refresh-token"];

/// Called once the session is irrecoverable and the user must sign in again.
pub type SignInRedirect = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Initial,
    Refreshing,
    Retried,
    LoggedOut,
    Done,
}

/// How concurrent requests that all hit an expired token are refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// One refresh at a time. Requests that waited on a concurrent refresh
    /// for the same stale token take its outcome: the new token on success,
    /// the same error (without another sign-out) on failure.
    #[default]
    Coalesce,
    /// Every failing request refreshes on its own.
    PerRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: Option<String>,
}

/// Outcome of the last implicit refresh, read by requests that queued
/// behind it on the refresh lock.
#[derive(Debug, Default)]
struct RefreshRecord {
    generation: u64,
    failure: Option<(Option<String>, ApiError)>,
}

#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
    on_sign_in: SignInRedirect,
    policy: RefreshPolicy,
    last_refresh: Arc<Mutex<RefreshRecord>>,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionManager>) -> Self {
        AuthClient {
            transport,
            session,
            on_sign_in: Arc::new(|| warn!("session expired; sign in again")),
            policy: RefreshPolicy::default(),
            last_refresh: Arc::new(Mutex::new(RefreshRecord::default())),
        }
    }

    /// Replaces the hook run after a failed refresh.
    pub fn with_sign_in_redirect(mut self, hook: SignInRedirect) -> Self {
        self.on_sign_in = hook;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Sends `request` with credentials attached and returns a success
    /// response, refreshing and retrying once on `401 Unauthorized`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] for any non-success status left after the flow
    /// - the refresh call's own error when the refresh fails; the stored
    ///   token is cleared and the sign-in hook has run once by then
    /// - [`ApiError::Network`] when no response arrived
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut state = RequestState::Initial;
        let sent_with = self.attach_token(&mut request).await;

        loop {
            let response = self.dispatch(&mut request).await?;

            if response.status() != reqwest::StatusCode::UNAUTHORIZED {
                transition(&request, &mut state, RequestState::Done);
                return response.into_result();
            }

            if request.is_retried() {
                debug!(path = %request.path(), "unauthorized after retry; giving up");
                return response.into_result();
            }

            request.mark_retried();
            transition(&request, &mut state, RequestState::Refreshing);

            match self.refresh_for(sent_with.as_deref()).await {
                Ok(token) => {
                    request.set_bearer(&token)?;
                    transition(&request, &mut state, RequestState::Retried);
                }
                Err(e) => {
                    transition(&request, &mut state, RequestState::LoggedOut);
                    return Err(e);
                }
            }
        }
    }

    /// Explicitly exchanges the refresh credential for a new session token.
    ///
    /// Unlike the implicit refresh inside [`AuthClient::execute`], a failure
    /// here leaves the session untouched.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        let _guard = self.session.refresh_guard().await;
        self.call_refresh().await
    }

    /// attachToken: sets `Authorization: Bearer <token>` if a token is stored.
    /// Returns the token used, if any.
    async fn attach_token(&self, request: &mut ApiRequest) -> Option<String> {
        match self.session.access_token().await {
            Some(token) => match request.set_bearer(&token) {
                Ok(()) => Some(token),
                Err(e) => {
                    warn!("stored token unusable: {}", e);
                    request.clear_bearer();
                    None
                }
            },
            None => {
                request.clear_bearer();
                None
            }
        }
    }

    /// Sends the request with the refresh cookie and records any cookie the
    /// backend sets in return.
    async fn dispatch(&self, request: &mut ApiRequest) -> Result<ApiResponse, ApiError> {
        if let Some(cookie) = self.session.cookie_header().await {
            request.set_cookie(&cookie);
        }

        let response = self.transport.send(request).await?;
        self.session.record_set_cookies(response.headers()).await;
        Ok(response)
    }

    /// Refreshes on behalf of a request rejected with `stale`.
    ///
    /// A failed refresh signs out before the refresh lock is released, so
    /// queued requests never observe a half-finished logout.
    async fn refresh_for(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let seen = self.last_refresh.lock().await.generation;
        let _guard = self.session.refresh_guard().await;

        if self.policy == RefreshPolicy::Coalesce {
            if let Some(shared) = self.shared_failure(seen, stale).await {
                debug!("reusing failed refresh of a concurrent request");
                return Err(shared);
            }
            if let Some(current) = self.session.access_token().await {
                if Some(current.as_str()) != stale {
                    debug!("token already refreshed by a concurrent request");
                    return Ok(current);
                }
            }
        }

        let result = self.call_refresh().await;
        if result.is_err() {
            self.sign_out().await;
        }

        let mut record = self.last_refresh.lock().await;
        record.generation += 1;
        record.failure = result
            .as_ref()
            .err()
            .map(|e| (stale.map(str::to_string), e.clone()));
        result
    }

    /// The error of a refresh that finished after `seen` for the same stale
    /// token, if there was one.
    async fn shared_failure(&self, seen: u64, stale: Option<&str>) -> Option<ApiError> {
        let record = self.last_refresh.lock().await;
        if record.generation == seen {
            return None;
        }
        match &record.failure {
            Some((failed_for, e)) if failed_for.as_deref() == stale => Some(e.clone()),
            _ => None,
        }
    }

    /// POSTs to the refresh endpoint without a body or bearer token and
    /// stores the returned token. Callers hold the refresh guard.
    async fn call_refresh(&self) -> Result<String, ApiError> {
        debug!("refreshing session token");
        let mut request = ApiRequest::post(REFRESH_PATH);
        let response = self.dispatch(&mut request).await?.into_result()?;

        let token = response
            .json::<RefreshResponse>()?
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Decode("refresh response has no accessToken".into()))?;

        self.session.set_access_token(&token).await?;
        debug!("session token refreshed");
        Ok(token)
    }

    async fn sign_out(&self) {
        if let Err(e) = self.session.clear_access_token().await {
            warn!("failed to clear session token: {}", e);
        }
        (self.on_sign_in)();
    }
}

impl fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn transition(request: &ApiRequest, state: &mut RequestState, next: RequestState) {
    trace!(path = %request.path(), from = ?*state, to = ?next, "request state");
    *state = next;
}
