mod session;
mod store;

pub use session::ACCESS_TOKEN_KEY;
pub use session::REFRESH_COOKIE;
pub use session::SessionManager;
pub use session::parse_refresh_cookie;
pub use store::FileTokenStore;
pub use store::MemoryTokenStore;
pub use store::StoreError;
pub use store::TokenStore;
