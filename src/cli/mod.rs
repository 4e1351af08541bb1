//! # CLI Module
//!
//! User-facing commands of the SortUrl client. Each command builds on the
//! [`crate::shortener`] operations, shows a spinner while the backend works
//! and renders the result as colored lines, tables or bar charts.
//!
//! ## Commands
//!
//! - [`register`], [`login`], [`refresh`], [`logout`], [`status`] - account and session
//! - [`shorten`] - create a short link
//! - [`list_urls`], [`copy_url`], [`delete_url`], [`open_url`] - manage existing links
//! - [`analytics`] - per-day clicks for one link
//! - [`dashboard`] - totals and the 30-day overview for all links
//!
//! ## Error Handling
//!
//! Failures print the backend's message, or a fixed fallback when it sent
//! none, and exit with status 1. An expired session that cannot be renewed
//! additionally prints the sign-in instruction first.
//!
//! ## Usage Patterns
//!
//! ```bash
//! sorturl auth login --email you@example.com --password secret
//! sorturl shorten https://example.com/a/very/long/path
//! sorturl urls
//! sorturl analytics abc123 --range 7d
//! sorturl dashboard
//! ```

mod analytics;
mod auth;
mod dashboard;
mod urls;

use std::sync::Arc;

pub use analytics::analytics;
pub use auth::login;
pub use auth::logout;
pub use auth::refresh;
pub use auth::register;
pub use auth::status;
pub use dashboard::dashboard;
pub use urls::copy_url;
pub use urls::delete_url;
pub use urls::list_urls;
pub use urls::open_url;
pub use urls::shorten;

use crate::{
    config, error,
    management::{FileTokenStore, SessionManager},
    shortener::{AuthClient, HttpTransport},
    warning,
};

/// Opens the persisted session and builds the client every command uses.
async fn connect() -> AuthClient {
    let store = match FileTokenStore::open(config::session_path()).await {
        Ok(store) => store,
        Err(e) => error!("Cannot open session storage. Err: {}", e),
    };

    let transport = match HttpTransport::new(&config::api_base_url()) {
        Ok(t) => t,
        Err(e) => error!("{}", e),
    };

    let session = Arc::new(SessionManager::new(Arc::new(store)));
    AuthClient::new(Arc::new(transport), session).with_sign_in_redirect(Arc::new(|| {
        warning!("Your session has expired. Please run sorturl auth login.")
    }))
}
