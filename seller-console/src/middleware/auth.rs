use crate::session::store::ACCESS_TOKEN;
use crate::session::SessionStore;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

pub const LOGIN_PATH: &str = "/auth/login";

/// Let the request through only when the session holds an access token.
pub async fn require_session(session: Session, request: Request<Body>, next: Next) -> Response {
    let access_token = match SessionStore::get(&session, ACCESS_TOKEN).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read session");
            None
        }
    };

    if access_token.is_none() {
        tracing::debug!(path = %request.uri().path(), "No session, redirecting to login");
        return login_redirect(request.headers());
    }

    next.run(request).await
}

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("HX-Request")
}

/// Navigate to `to`: an `HX-Redirect` for HTMX requests, a 303 otherwise.
pub fn redirect(headers: &HeaderMap, to: &str) -> Response {
    if !is_htmx(headers) {
        return Redirect::to(to).into_response();
    }

    match HeaderValue::from_str(to) {
        Ok(location) => {
            let mut response = StatusCode::OK.into_response();
            response.headers_mut().insert("HX-Redirect", location);
            response
        }
        Err(_) => Redirect::to(to).into_response(),
    }
}

pub fn login_redirect(headers: &HeaderMap) -> Response {
    redirect(headers, LOGIN_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn plain_requests_get_a_see_other() {
        let response = login_redirect(&HeaderMap::new());
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/auth/login");
    }

    #[test]
    fn htmx_requests_get_hx_redirect() {
        let mut headers = HeaderMap::new();
        headers.insert("HX-Request", HeaderValue::from_static("true"));

        let response = redirect(&headers, "/dashboard");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["HX-Redirect"], "/dashboard");
    }
}
