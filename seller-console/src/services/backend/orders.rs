use super::SellerApi;
use crate::models::{Order, OrderStatus};
use crate::services::error::ApiError;
use crate::services::request::ApiRequest;
use crate::session::SessionStore;
use serde_json::{json, Value};

impl<S: SessionStore> SellerApi<'_, S> {
    pub async fn orders(
        &self,
        status: OrderStatus,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Order>, ApiError> {
        self.fetch_list(
            ApiRequest::get("/order")
                .query("status", status)
                .query("page", page)
                .query("limit", limit),
        )
        .await
    }

    pub async fn order(&self, order_id: &str) -> Result<Order, ApiError> {
        self.fetch(ApiRequest::get(format!("/order/{order_id}"))).await
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut body = json!({ "status": status });
        if let Some(tracking) = tracking_number.map(str::trim).filter(|t| !t.is_empty()) {
            body["trackingNumber"] = json!(tracking);
        }

        self.send(ApiRequest::patch(format!("/order/{order_id}/status")).json(body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::test_support::signed_in;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn orders_filter_by_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/order"))
            .and(query_param("status", "in_progress"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"_id": "o1", "orderId": "ORD-1", "status": "in_progress"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, session) = signed_in(&server.uri()).await;
        let orders = SellerApi::new(&client, &session)
            .orders(OrderStatus::InProgress, 1, 10)
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "ORD-1");
    }

    #[tokio::test]
    async fn blank_tracking_number_is_omitted() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/order/ORD-1/status"))
            .and(body_json(json!({"status": "shipped"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let (client, session) = signed_in(&server.uri()).await;
        SellerApi::new(&client, &session)
            .update_order_status("ORD-1", OrderStatus::Shipped, Some("  "))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_update_reports_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/order/ORD-1/status"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"success": false, "message": "Order already delivered"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (client, session) = signed_in(&server.uri()).await;
        let err = SellerApi::new(&client, &session)
            .update_order_status("ORD-1", OrderStatus::Cancelled, None)
            .await
            .unwrap_err();

        assert_eq!(err.user_message("Failed to update order"), "Order already delivered");
    }
}
