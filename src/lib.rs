//! SortUrl command-line client library
//!
//! This library talks to the SortUrl link-shortening backend. It wraps every
//! outbound request with the stored session token, silently renews an expired
//! token once per request, and exposes the backend's link and click-analytics
//! operations together with helpers for rendering them in a terminal.
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `logging` - Diagnostic logging setup
//! - `management` - Session token storage and lifecycle
//! - `shortener` - Backend API client, auth refresh and endpoint operations
//! - `types` - Data structures and type definitions
//! - `utils` - Date formatting, summaries and other helpers
//!
//! # Example
//!
//! ```
//! use sorturl::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> sorturl::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod logging;
pub mod management;
pub mod shortener;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the glue code between the CLI and the library where the concrete
/// error type does not matter to the caller. Keeps the Send + Sync bounds
/// needed across await points.
///
/// # Example
///
/// ```
/// use sorturl::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching your links...");
/// info!("Found {} links", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Short URL created!");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates with exit code 1 right after printing. Only the command layer
/// uses it; library code returns errors instead.
///
/// # Example
///
/// ```
/// error!("Failed to load URLs");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Session expired. Please sign in again.");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
