use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    StatusCode,
    header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE},
};
use serde_json::json;
use sorturl::{
    management::{ACCESS_TOKEN_KEY, MemoryTokenStore, REFRESH_COOKIE, SessionManager, TokenStore},
    shortener::{
        ApiError, ApiRequest, ApiResponse, AuthClient, RefreshPolicy, Transport, auth, urls,
    },
};

type Handler = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync>;

// Records every request and answers through `handler`.
struct FakeBackend {
    handler: Handler,
    requests: Mutex<Vec<ApiRequest>>,
    yield_first: bool,
}

impl FakeBackend {
    fn new(handler: Handler) -> Arc<Self> {
        Arc::new(FakeBackend {
            handler,
            requests: Mutex::new(Vec::new()),
            yield_first: false,
        })
    }

    // Suspends once per request so concurrent callers interleave.
    fn interleaving(handler: Handler) -> Arc<Self> {
        Arc::new(FakeBackend {
            handler,
            requests: Mutex::new(Vec::new()),
            yield_first: true,
        })
    }

    // Answers with `responses` in order.
    fn scripted(responses: Vec<Result<ApiResponse, ApiError>>) -> Arc<Self> {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(Box::new(move |request| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected request to {}", request.path()))
        }))
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn count_path(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path() == path)
            .count()
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        if self.yield_first {
            tokio::task::yield_now().await;
        }
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }
}

fn ok(body: serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::json_body(StatusCode::OK, &body))
}

fn status(code: StatusCode, body: serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::json_body(code, &body))
}

fn unauthorized() -> Result<ApiResponse, ApiError> {
    status(StatusCode::UNAUTHORIZED, json!({ "message": "Token expired" }))
}

async fn session_with_token(token: Option<&str>) -> Arc<SessionManager> {
    let store = Arc::new(MemoryTokenStore::new());
    if let Some(token) = token {
        store.set(ACCESS_TOKEN_KEY, token).await.unwrap();
    }
    Arc::new(SessionManager::new(store))
}

fn client(backend: Arc<FakeBackend>, session: Arc<SessionManager>) -> (AuthClient, Arc<AtomicUsize>) {
    let redirects = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&redirects);
    let client = AuthClient::new(backend, session).with_sign_in_redirect(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    (client, redirects)
}

#[tokio::test]
async fn test_stored_token_is_sent_as_bearer() {
    let backend = FakeBackend::scripted(vec![ok(json!([]))]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, _) = client(backend.clone(), session);

    client.execute(ApiRequest::get(["urls", "my-urls"])).await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization(), Some("Bearer tok-1"));
}

#[tokio::test]
async fn test_request_without_token_is_still_dispatched() {
    let backend = FakeBackend::scripted(vec![ok(json!({ "ok": true }))]);
    let session = session_with_token(None).await;
    let (client, _) = client(backend.clone(), session);

    let response = client
        .execute(ApiRequest::get(["urls", "my-urls"]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization(), None);
}

#[tokio::test]
async fn test_unauthorized_refreshes_once_and_retries_with_new_token() {
    let backend = FakeBackend::scripted(vec![
        unauthorized(),
        ok(json!({ "accessToken": "tok-2" })),
        ok(json!([{ "clickDate": "2024-07-15", "count": 3 }])),
    ]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, redirects) = client(backend.clone(), Arc::clone(&session));

    let response = client
        .execute(ApiRequest::get(["urls", "analytics", "abc"]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = backend.requests();
    assert_eq!(requests.len(), 3);

    assert_eq!(requests[0].path(), "/urls/analytics/abc");
    assert_eq!(requests[0].authorization(), Some("Bearer tok-1"));
    assert!(!requests[0].is_retried());

    assert_eq!(requests[1].path(), "/auth/refresh-token");
    assert_eq!(requests[1].method(), &reqwest::Method::POST);
    assert_eq!(requests[1].authorization(), None);
    assert!(requests[1].body().is_none());

    assert_eq!(requests[2].path(), "/urls/analytics/abc");
    assert_eq!(requests[2].authorization(), Some("Bearer tok-2"));
    assert!(requests[2].is_retried());

    assert_eq!(session.access_token().await.as_deref(), Some("tok-2"));
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_refresh_clears_token_and_propagates_refresh_error() {
    let backend = FakeBackend::scripted(vec![
        unauthorized(),
        status(
            StatusCode::UNAUTHORIZED,
            json!({ "message": "Refresh token missing" }),
        ),
    ]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, redirects) = client(backend.clone(), Arc::clone(&session));

    let err = client
        .execute(ApiRequest::get(["urls", "my-urls"]))
        .await
        .unwrap_err();

    match &err {
        ApiError::Http { status, message } => {
            assert_eq!(*status, StatusCode::UNAUTHORIZED);
            assert_eq!(message.as_deref(), Some("Refresh token missing"));
        }
        other => panic!("expected refresh error, got {:?}", other),
    }
    assert_eq!(err.user_message("Failed to load URLs"), "Refresh token missing");

    assert_eq!(backend.requests().len(), 2);
    assert_eq!(session.access_token().await, None);
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_request_already_marked_retried_is_not_refreshed() {
    let backend = FakeBackend::scripted(vec![unauthorized()]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, redirects) = client(backend.clone(), Arc::clone(&session));

    let mut request = ApiRequest::get(["urls", "my-urls"]);
    request.mark_retried();
    let err = client.execute(request).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(backend.count_path("/auth/refresh-token"), 0);
    assert_eq!(session.access_token().await.as_deref(), Some("tok-1"));
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_retry_rejected_again_does_not_refresh_twice() {
    let backend = FakeBackend::scripted(vec![
        unauthorized(),
        ok(json!({ "accessToken": "tok-2" })),
        unauthorized(),
    ]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, redirects) = client(backend.clone(), Arc::clone(&session));

    let err = client
        .execute(ApiRequest::get(["urls", "my-urls"]))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(backend.requests().len(), 3);
    assert_eq!(backend.count_path("/auth/refresh-token"), 1);
    assert_eq!(session.access_token().await.as_deref(), Some("tok-2"));
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_other_errors_pass_through_unchanged() {
    let backend = FakeBackend::scripted(vec![status(
        StatusCode::BAD_REQUEST,
        json!({ "message": "Invalid URL format" }),
    )]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, _) = client(backend.clone(), session);

    let err = urls::create_short_url(&client, "not a url").await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(
        err.user_message("Failed to create short URL"),
        "Invalid URL format"
    );
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_error_without_message_uses_fallback() {
    let backend = FakeBackend::scripted(vec![Ok(ApiResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        HeaderMap::new(),
        Vec::new(),
    ))]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, _) = client(backend, session);

    let err = urls::my_urls(&client).await.unwrap_err();
    assert_eq!(err.user_message("Failed to load URLs"), "Failed to load URLs");
}

#[tokio::test]
async fn test_network_failure_uses_fallback() {
    let backend = FakeBackend::scripted(vec![Err(ApiError::Network(
        "connection refused".into(),
    ))]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, redirects) = client(backend, session);

    let err = urls::delete_url(&client, "abc").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.user_message("Failed to delete URL"), "Failed to delete URL");
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refresh_without_token_in_body_logs_out() {
    let backend = FakeBackend::scripted(vec![unauthorized(), ok(json!({}))]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, redirects) = client(backend, Arc::clone(&session));

    let err = urls::my_urls(&client).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
    assert_eq!(session.access_token().await, None);
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_login_stores_token_for_following_requests() {
    let backend = FakeBackend::new(Box::new(|request| match request.path().as_str() {
        "/auth/login" => {
            let body = request.body().cloned().unwrap_or_default();
            assert_eq!(body, json!({ "email": "a@b.com", "password": "x" }));
            let mut response =
                ApiResponse::json_body(StatusCode::OK, &json!({ "accessToken": "tok-login" }));
            let mut headers = response.headers().clone();
            headers.append(
                SET_COOKIE,
                HeaderValue::from_static("refreshToken=rt-1; Path=/; HttpOnly; Secure"),
            );
            response = ApiResponse::new(response.status(), headers, response.body().to_vec());
            Ok(response)
        }
        _ => ok(json!([])),
    }));
    let session = session_with_token(None).await;
    let (client, _) = client(backend.clone(), Arc::clone(&session));

    let login = auth::login(&client, "  a@b.com ", "x").await.unwrap();
    assert_eq!(login.access_token, "tok-login");
    assert_eq!(session.access_token().await.as_deref(), Some("tok-login"));
    assert_eq!(session.refresh_credential().await.as_deref(), Some("rt-1"));

    urls::my_urls(&client).await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].authorization(), Some("Bearer tok-login"));
    assert_eq!(requests[1].header(COOKIE), Some("refreshToken=rt-1"));
}

#[tokio::test]
async fn test_refresh_call_presents_refresh_cookie_only() {
    let store = Arc::new(MemoryTokenStore::new());
    store.set(ACCESS_TOKEN_KEY, "tok-1").await.unwrap();
    store.set(REFRESH_COOKIE, "rt-9").await.unwrap();
    let session = Arc::new(SessionManager::new(store));

    let backend = FakeBackend::scripted(vec![
        unauthorized(),
        ok(json!({ "accessToken": "tok-2" })),
        ok(json!([])),
    ]);
    let (client, _) = client(backend.clone(), session);

    urls::my_urls(&client).await.unwrap();

    let refresh = &backend.requests()[1];
    assert_eq!(refresh.path(), "/auth/refresh-token");
    assert_eq!(refresh.header(COOKIE), Some("refreshToken=rt-9"));
    assert_eq!(refresh.authorization(), None);
}

#[tokio::test]
async fn test_login_validation_never_touches_network() {
    let backend = FakeBackend::scripted(vec![]);
    let session = session_with_token(None).await;
    let (client, _) = client(backend.clone(), session);

    let err = auth::login(&client, "   ", "secret").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(err.user_message("Invalid credentials"), "Please fill in all fields");

    let err = auth::register(&client, "Ann", "ann@example.com", "")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = urls::create_short_url(&client, " \t").await.unwrap_err();
    assert_eq!(err.user_message("Failed to create short URL"), "Please enter a URL");

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_date_bounds_use_contract_formats() {
    let backend = FakeBackend::new(Box::new(|request| match request.path().as_str() {
        "/urls/total-clicks" => ok(json!({ "2024-07-02": 4, "2024-07-01": 1 })),
        _ => ok(json!([{ "clickDate": "2024-07-01", "count": 2 }])),
    }));
    let session = session_with_token(Some("tok-1")).await;
    let (client, _) = client(backend.clone(), session);

    let start = NaiveDate::from_ymd_opt(2024, 7, 1)
        .unwrap()
        .and_hms_opt(8, 5, 9)
        .unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 7, 31)
        .unwrap()
        .and_hms_opt(23, 0, 0)
        .unwrap();
    let events = urls::analytics(&client, "abc", &start, &end).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].count, 2);

    let totals = urls::total_clicks(&client, &start.date(), &end.date())
        .await
        .unwrap();
    assert_eq!(totals.get("2024-07-02"), Some(&4));

    let requests = backend.requests();
    assert_eq!(requests[0].path(), "/urls/analytics/abc");
    assert_eq!(requests[0].query_value("startDate"), Some("2024-07-01T08:05:09"));
    assert_eq!(requests[0].query_value("endDate"), Some("2024-07-31T23:00:00"));
    assert_eq!(requests[1].query_value("startDate"), Some("2024-07-01"));
    assert_eq!(requests[1].query_value("endDate"), Some("2024-07-31"));
}

#[tokio::test]
async fn test_null_analytics_body_is_empty_series() {
    let backend = FakeBackend::scripted(vec![ok(serde_json::Value::Null)]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, _) = client(backend, session);

    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let events = urls::analytics(&client, "abc", &start, &start).await.unwrap();
    assert!(events.is_empty());
}

// Every request carrying the stale token is rejected; the refresh endpoint
// always hands out "fresh".
fn expiring_backend(refreshes: Arc<AtomicUsize>) -> Handler {
    Box::new(move |request| {
        if request.path() == "/auth/refresh-token" {
            refreshes.fetch_add(1, Ordering::SeqCst);
            return ok(json!({ "accessToken": "fresh" }));
        }
        match request.authorization() {
            Some("Bearer fresh") => ok(json!([])),
            _ => unauthorized(),
        }
    })
}

#[tokio::test]
async fn test_concurrent_failures_share_one_refresh_when_coalescing() {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let backend = FakeBackend::interleaving(expiring_backend(Arc::clone(&refreshes)));
    let session = session_with_token(Some("stale")).await;
    let (client, _) = client(backend.clone(), session);
    let client = client.with_refresh_policy(RefreshPolicy::Coalesce);

    let (a, b) = tokio::join!(urls::my_urls(&client), urls::my_urls(&client));
    assert!(a.is_ok());
    assert!(b.is_ok());

    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(backend.count_path("/urls/my-urls"), 4);
}

#[tokio::test]
async fn test_concurrent_failures_refresh_independently_per_request() {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let backend = FakeBackend::interleaving(expiring_backend(Arc::clone(&refreshes)));
    let session = session_with_token(Some("stale")).await;
    let (client, _) = client(backend.clone(), session);
    let client = client.with_refresh_policy(RefreshPolicy::PerRequest);

    let (a, b) = tokio::join!(urls::my_urls(&client), urls::my_urls(&client));
    assert!(a.is_ok());
    assert!(b.is_ok());

    assert_eq!(refreshes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_failures_share_one_failed_refresh_when_coalescing() {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&refreshes);
    let backend = FakeBackend::interleaving(Box::new(move |request| {
        if request.path() == "/auth/refresh-token" {
            counter.fetch_add(1, Ordering::SeqCst);
            return status(
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Refresh token missing" }),
            );
        }
        unauthorized()
    }));
    let session = session_with_token(Some("stale")).await;
    let (client, redirects) = client(backend.clone(), Arc::clone(&session));
    let client = client.with_refresh_policy(RefreshPolicy::Coalesce);

    let (a, b) = tokio::join!(urls::my_urls(&client), urls::my_urls(&client));
    let (a, b) = (a.unwrap_err(), b.unwrap_err());

    assert_eq!(a.user_message("Failed to load URLs"), "Refresh token missing");
    assert_eq!(b.user_message("Failed to load URLs"), "Refresh token missing");
    assert!(b.is_unauthorized());

    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
    assert_eq!(backend.count_path("/urls/my-urls"), 2);
    assert_eq!(session.access_token().await, None);
}

#[tokio::test]
async fn test_later_request_refreshes_again_after_failed_refresh() {
    let backend = FakeBackend::scripted(vec![
        unauthorized(),
        status(StatusCode::UNAUTHORIZED, json!({})),
        unauthorized(),
        ok(json!({ "accessToken": "tok-3" })),
        ok(json!([])),
    ]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, redirects) = client(backend.clone(), Arc::clone(&session));

    assert!(urls::my_urls(&client).await.is_err());
    assert_eq!(redirects.load(Ordering::SeqCst), 1);

    session.set_access_token("tok-1").await.unwrap();
    urls::my_urls(&client).await.unwrap();

    assert_eq!(backend.count_path("/auth/refresh-token"), 2);
    assert_eq!(session.access_token().await.as_deref(), Some("tok-3"));
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_explicit_refresh_stores_new_token() {
    let store = Arc::new(MemoryTokenStore::new());
    store.set(ACCESS_TOKEN_KEY, "tok-1").await.unwrap();
    store.set(REFRESH_COOKIE, "rt-9").await.unwrap();
    let session = Arc::new(SessionManager::new(store));

    let backend = FakeBackend::scripted(vec![ok(json!({ "accessToken": "tok-2" }))]);
    let (client, redirects) = client(backend.clone(), Arc::clone(&session));

    let token = auth::refresh(&client).await.unwrap();
    assert_eq!(token, "tok-2");
    assert_eq!(session.access_token().await.as_deref(), Some("tok-2"));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path(), "/auth/refresh-token");
    assert_eq!(requests[0].method(), &reqwest::Method::POST);
    assert_eq!(requests[0].authorization(), None);
    assert_eq!(requests[0].header(COOKIE), Some("refreshToken=rt-9"));
    assert!(requests[0].body().is_none());
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_explicit_refresh_failure_keeps_session() {
    let backend = FakeBackend::scripted(vec![status(
        StatusCode::UNAUTHORIZED,
        json!({ "message": "Refresh token expired" }),
    )]);
    let session = session_with_token(Some("tok-1")).await;
    let (client, redirects) = client(backend.clone(), Arc::clone(&session));

    let err = auth::refresh(&client).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.user_message("Failed to renew session"), "Refresh token expired");
    assert_eq!(session.access_token().await.as_deref(), Some("tok-1"));
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
    assert_eq!(backend.requests().len(), 1);
}
