//! Session handling: token persistence and the current-user context

pub mod context;
pub mod token_store;

pub use context::AuthContext;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
