//! Configuration management for the SortUrl client.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage the backend
//! location and the paths where the client keeps its local state.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults

use std::{env, path::PathBuf};

use crate::Res;

/// Backend base URL used when `SORTURL_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";

const APP_DIR: &str = "sorturl";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the application directory if it doesn't exist and loads variables
/// from `sorturl/.env` under the platform-specific local data directory:
/// - Linux: `~/.local/share/sorturl/.env`
/// - macOS: `~/Library/Application Support/sorturl/.env`
/// - Windows: `%LOCALAPPDATA%/sorturl/.env`
///
/// A missing `.env` file is not an error since every setting has a default.
/// Variables already present in the process environment are never overwritten.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file exists
/// but cannot be parsed.
///
/// # Example
///
/// ```
/// use sorturl::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Res<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(())
}

/// Returns the base URL of the SortUrl backend API.
///
/// Reads `SORTURL_API_BASE_URL` and falls back to [`DEFAULT_API_BASE_URL`].
/// Trailing slashes are removed so paths can be appended directly.
///
/// # Example
///
/// ```
/// let base = api_base_url(); // e.g., "http://localhost:8080/api/v1"
/// ```
pub fn api_base_url() -> String {
    env::var("SORTURL_API_BASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Returns the directory holding the client's local files.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Returns the path of the persisted session file.
///
/// The file stores the session token and the captured refresh credential
/// as a flat JSON object, one entry per storage key.
pub fn session_path() -> PathBuf {
    data_dir().join("session.json")
}
