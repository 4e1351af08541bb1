//! # SortUrl Backend Module
//!
//! Client side of the SortUrl REST API. The backend owns shortening,
//! persistence, redirection and click counting; this module only sends
//! requests and hands the payloads back.
//!
//! ## Layers
//!
//! ```text
//! CLI commands
//!      ↓
//! auth / urls          endpoint operations
//!      ↓
//! AuthClient           bearer token, 401 -> refresh -> retry once
//!      ↓
//! Transport            HttpTransport (reqwest) or a test double
//!      ↓
//! SortUrl backend
//! ```
//!
//! ## Endpoints
//!
//! - `POST /auth/register`, `POST /auth/login`, `POST /auth/refresh-token`
//! - `POST /urls/shorten`, `GET /urls/my-urls`, `DELETE /urls/{shortUrl}`
//! - `GET /urls/analytics/{shortUrl}?startDate&endDate` (local date-times)
//! - `GET /urls/total-clicks?startDate&endDate` (dates)
//!
//! ## Errors
//!
//! Every operation returns [`ApiError`]. Only a `401 Unauthorized` is ever
//! retried, once, after a successful refresh; everything else reaches the
//! caller unchanged.

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod urls;

pub use client::{AuthClient, RefreshPolicy, RequestState, SignInRedirect};
pub use error::ApiError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
