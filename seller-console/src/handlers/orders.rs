use super::forms::{clamp_page, OrderStatusForm};
use super::{fail, loaded, reject, seller_api, session_expired, succeed, Layout};
use crate::models::{AuthUser, Order, OrderStatus};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;

pub const PAGE_SIZE: u32 = 10;

#[derive(Template)]
#[template(path = "orders/list.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<Order>,
    pub status: OrderStatus,
    pub statuses: [OrderStatus; 5],
    pub page: u32,
    pub has_next: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

impl OrdersQuery {
    /// Unknown or missing filters read as pending.
    pub fn status(&self) -> OrderStatus {
        self.status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(OrderStatus::Pending)
    }

    pub fn page(&self) -> u32 {
        clamp_page(self.page)
    }

    pub fn path(&self) -> String {
        orders_path(self.status(), self.page())
    }
}

fn orders_path(status: OrderStatus, page: u32) -> String {
    format!("/dashboard/orders?status={status}&page={page}")
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Query(query): Query<OrdersQuery>,
) -> Response {
    let mut layout = Layout::new(&user, "orders").await;
    let (status, page) = (query.status(), query.page());

    let Some(orders) = loaded(
        seller_api(&state, &user)
            .orders(status, page, PAGE_SIZE)
            .await,
        "Failed to load orders",
        &mut layout,
    ) else {
        return session_expired(user.session.store(), &headers).await;
    };

    OrdersTemplate {
        layout,
        has_next: orders.len() as u32 >= PAGE_SIZE,
        orders,
        status,
        statuses: OrderStatus::ALL,
        page,
    }
    .into_response()
}

/// Orders are addressed by their `orderId`, not the document id.
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Path(order_id): Path<String>,
    Form(form): Form<OrderStatusForm>,
) -> Response {
    let back = OrdersQuery {
        status: form.filter.clone(),
        page: form.page,
    }
    .path();

    let Ok(status) = form.status.trim().parse::<OrderStatus>() else {
        return reject(&user, &headers, "Please select a status", &back).await;
    };

    match seller_api(&state, &user)
        .update_order_status(&order_id, status, form.tracking_number.as_deref())
        .await
    {
        Ok(_) => {
            tracing::info!(order_id = %order_id, status = %status, "Order status updated");
            succeed(&user, &headers, "Order status updated successfully", &back).await
        }
        Err(e) => fail(&user, &headers, e, "Failed to update order", &back).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::forms::MAX_PAGE;

    #[test]
    fn filter_defaults_to_pending() {
        let query = OrdersQuery::default();
        assert_eq!(query.status(), OrderStatus::Pending);
        assert_eq!(query.path(), "/dashboard/orders?status=pending&page=1");

        let query = OrdersQuery {
            status: Some("bogus".into()),
            page: Some(0),
        };
        assert_eq!(query.status(), OrderStatus::Pending);
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn filter_round_trips_through_the_path() {
        let query = OrdersQuery {
            status: Some("in_progress".into()),
            page: Some(3),
        };
        assert_eq!(query.path(), "/dashboard/orders?status=in_progress&page=3");
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let query = OrdersQuery {
            status: None,
            page: Some(u32::MAX),
        };
        assert_eq!(query.page(), MAX_PAGE);
        assert_eq!(
            query.path(),
            format!("/dashboard/orders?status=pending&page={MAX_PAGE}")
        );
    }
}
