//! Auth session store
//!
//! Persists the signed-in session between runs and keeps it valid:
//! - `TokenStore` for persistence (file or memory)
//! - `AuthApi` for remote validation and logout
//! - `SessionManager` tying both together; it is also the `TokenSource`
//!   that puts the bearer token on search requests

mod api;
mod manager;
mod store;
mod types;

pub use api::{AuthApi, HttpAuthApi};
pub use manager::SessionManager;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::{Session, UserIdentity};
