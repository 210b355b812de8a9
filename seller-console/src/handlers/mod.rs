//! Console pages. Full-page handlers follow post/redirect/get: failures are
//! queued as notices and shown by the next rendered page.

pub mod app;
pub mod auth;
pub mod countries;
pub mod dashboard;
pub mod forms;
pub mod messages;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod settings;
pub mod shop;
pub mod upload;

use crate::middleware::auth::{login_redirect, redirect};
use crate::models::AuthUser;
use crate::services::{ApiError, SellerApi};
use crate::session::{drain_notices, push_notice, Notice, SessionStore};
use crate::AppState;
use axum::http::HeaderMap;
use axum::response::Response;
use tower_sessions::Session;

/// Shell data every signed-in page renders.
pub struct Layout {
    pub user_name: String,
    pub initials: String,
    pub current_page: &'static str,
    pub notices: Vec<Notice>,
}

impl Layout {
    pub async fn new(user: &AuthUser, current_page: &'static str) -> Self {
        Self {
            user_name: user.name(),
            initials: user.initials(),
            current_page,
            notices: take_notices(user.session.store()).await,
        }
    }

    pub fn is_current(&self, page: &str) -> bool {
        self.current_page == page
    }
}

pub fn seller_api<'a>(state: &'a AppState, user: &'a AuthUser) -> SellerApi<'a, Session> {
    SellerApi::new(&state.api, &user.session)
}

pub async fn take_notices<S: SessionStore + ?Sized>(store: &S) -> Vec<Notice> {
    drain_notices(store).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to read notices");
        Vec::new()
    })
}

pub async fn notify<S: SessionStore + ?Sized>(store: &S, notice: Notice) {
    if let Err(e) = push_notice(store, notice).await {
        tracing::error!(error = %e, "Failed to queue notice");
    }
}

/// Queue a success notice and navigate to `to`.
pub async fn succeed(user: &AuthUser, headers: &HeaderMap, message: &str, to: &str) -> Response {
    notify(user.session.store(), Notice::success(message)).await;
    redirect(headers, to)
}

/// Queue an error notice and navigate back to `back`.
pub async fn reject(user: &AuthUser, headers: &HeaderMap, message: &str, back: &str) -> Response {
    notify(user.session.store(), Notice::error(message)).await;
    redirect(headers, back)
}

/// Navigate after a failed backend call. An expired session always lands on
/// the login page.
pub async fn fail(
    user: &AuthUser,
    headers: &HeaderMap,
    err: ApiError,
    fallback: &str,
    back: &str,
) -> Response {
    if err.is_session_expired() {
        return session_expired(user.session.store(), headers).await;
    }

    tracing::warn!(error = %err, "{}", fallback);
    reject(user, headers, &err.user_message(fallback), back).await
}

pub async fn session_expired<S: SessionStore + ?Sized>(store: &S, headers: &HeaderMap) -> Response {
    notify(store, Notice::error("Session expired. Please log in again.")).await;
    login_redirect(headers)
}

/// Page data, or `T::default()` with an error notice added to the layout.
/// `None` means the session expired and the caller should send the seller
/// to the login page.
pub fn loaded<T: Default>(
    result: Result<T, ApiError>,
    fallback: &str,
    layout: &mut Layout,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_session_expired() => None,
        Err(e) => {
            tracing::warn!(error = %e, "{}", fallback);
            layout.notices.push(Notice::error(e.user_message(fallback)));
            Some(T::default())
        }
    }
}
