use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Content security policy for the server-rendered console pages. Scripts may
/// come from the console itself, the HTMX CDN and the payment processor's
/// hosted card script; frames only from the processor.
const PAGE_CSP: &str = "default-src 'self'; \
     script-src 'self' 'unsafe-inline' https://unpkg.com https://js.stripe.com; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data: https:; \
     media-src 'self' https:; \
     frame-src https://js.stripe.com; \
     connect-src 'self' https://api.stripe.com; \
     frame-ancestors 'none'";

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(PAGE_CSP),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );

    response
}
