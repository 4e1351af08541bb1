use tracing::debug;

use crate::{
    management::SessionManager,
    shortener::{client::AuthClient, error::ApiError, transport::ApiRequest},
    types::{LoginRequest, LoginResponse, RegisterRequest},
};

/// Creates an account.
///
/// All fields are required; the email is trimmed before sending. The
/// backend's reply is returned as-is since the client never inspects it.
///
/// # Errors
///
/// [`ApiError::Validation`] without any network traffic when a field is
/// empty, otherwise whatever the backend or the network reports.
pub async fn register(
    client: &AuthClient,
    name: &str,
    email: &str,
    password: &str,
) -> Result<serde_json::Value, ApiError> {
    let (name, email) = (name.trim(), email.trim());
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("Please fill in all fields".into()));
    }

    let body = RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    let request = ApiRequest::post(["auth", "register"]).with_json(&body)?;
    let response = client.execute(request).await?;

    if response.body().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    response.json()
}

/// Signs in and stores the returned session token.
///
/// The refresh credential arrives as a cookie on the same response and is
/// captured by the client on the way through.
///
/// # Example
///
/// ```
/// let login = auth::login(&client, "a@b.com", "x").await?;
/// // every following request carries `Authorization: Bearer <login.access_token>`
/// ```
pub async fn login(
    client: &AuthClient,
    email: &str,
    password: &str,
) -> Result<LoginResponse, ApiError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("Please fill in all fields".into()));
    }

    let body = LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    };
    let request = ApiRequest::post(["auth", "login"]).with_json(&body)?;
    let login: LoginResponse = client.execute(request).await?.json()?;

    if login.access_token.is_empty() {
        return Err(ApiError::Decode("login response has no accessToken".into()));
    }

    client.session().set_access_token(&login.access_token).await?;
    debug!("signed in");
    Ok(login)
}

/// Renews the session token on demand and returns it.
pub async fn refresh(client: &AuthClient) -> Result<String, ApiError> {
    client.refresh().await
}

/// Forgets every local credential. The backend is not contacted.
pub async fn logout(session: &SessionManager) -> Result<(), ApiError> {
    session.logout().await?;
    debug!("signed out");
    Ok(())
}
