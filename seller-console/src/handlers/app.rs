use crate::middleware::auth::LOGIN_PATH;
use crate::session::store::ACCESS_TOKEN;
use crate::session::SessionStore;
use axum::response::Redirect;
use tower_sessions::Session;

pub async fn index(session: Session) -> Redirect {
    match SessionStore::get(&session, ACCESS_TOKEN).await {
        Ok(Some(_)) => Redirect::to("/dashboard"),
        Ok(None) => Redirect::to(LOGIN_PATH),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read session");
            Redirect::to(LOGIN_PATH)
        }
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
