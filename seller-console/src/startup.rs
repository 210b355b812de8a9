use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, index},
    auth::{
        enter_otp_handler, enter_otp_page, forgot_password_handler, forgot_password_page,
        login_handler, login_page, logout_handler, resend_otp_handler, reset_password_handler,
        reset_password_page,
    },
    countries::countries,
    dashboard::{overview, sales},
    messages::{channel_events, decide_call, messages_page, place_call, send_message, unmount_channel},
    metrics::metrics,
    orders::{list_orders, update_order_status},
    products::{
        add_product_handler, add_product_page, delete_product_handler, edit_product_handler,
        edit_product_page, list_products, pending_products,
    },
    settings::{change_password, confirm_payment, create_payment, settings_page},
    shop::{shop_page, update_shop},
};
use crate::middleware::auth::require_session;
use crate::AppState;

/// Routes that need a signed-in seller.
fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(overview))
        .route("/dashboard/sales", get(sales))
        .route("/dashboard/products", get(list_products))
        .route(
            "/dashboard/products/add",
            get(add_product_page).post(add_product_handler),
        )
        .route(
            "/dashboard/products/:id/edit",
            get(edit_product_page).post(edit_product_handler),
        )
        .route("/dashboard/products/:id/delete", post(delete_product_handler))
        .route("/dashboard/pending-products", get(pending_products))
        .route("/dashboard/orders", get(list_orders))
        .route("/dashboard/orders/:id/status", post(update_order_status))
        .route("/dashboard/shop", get(shop_page).post(update_shop))
        .route("/dashboard/messages", get(messages_page))
        .route("/dashboard/messages/:chat_id/send", post(send_message))
        .route("/dashboard/messages/:chat_id/call", post(place_call))
        .route("/dashboard/settings", get(settings_page))
        .route("/dashboard/settings/password", post(change_password))
        .route("/dashboard/settings/payments", post(create_payment))
        .route("/dashboard/settings/payments/confirm", post(confirm_payment))
        .route_layer(from_fn(require_session))
}

pub fn build_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.settings.server.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)))
        .with_signed(state.session_key.clone());

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/auth/login", get(login_page).post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route(
            "/auth/forgot-password",
            get(forgot_password_page).post(forgot_password_handler),
        )
        .route("/auth/enter-otp", get(enter_otp_page).post(enter_otp_handler))
        .route("/auth/enter-otp/resend", post(resend_otp_handler))
        .route(
            "/auth/reset-password",
            get(reset_password_page).post(reset_password_handler),
        )
        .route("/api/countries", get(countries))
        // Channel routes are addressed by an unguessable mount id and check
        // ownership themselves, so a page whose session expired can still
        // release its channel.
        .route(
            "/dashboard/messages/channel/:mount/events",
            get(channel_events),
        )
        .route(
            "/dashboard/messages/channel/:mount/calls/:prompt/:decision",
            post(decide_call),
        )
        .route(
            "/dashboard/messages/channel/:mount/unmount",
            post(unmount_channel),
        )
        .merge(dashboard_routes())
        .nest_service("/static", ServeDir::new("seller-console/static"))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
