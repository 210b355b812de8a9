//! Seller session: token storage, token lifecycle and queued notices.

pub mod manager;
pub mod model;
pub mod notice;
pub mod store;

pub use manager::{SessionError, SessionManager, TokenRefresher};
pub use model::{CachedProfile, LoginGrant, RefreshedTokens, Session};
pub use notice::{drain_notices, push_notice, Notice, NoticeLevel};
pub use store::{MemoryStore, SessionStore, StoreError};
