use super::SellerApi;
use crate::models::billing::active_plans;
use crate::models::{
    CreatePaymentRequest, Overview, PaymentIntent, ReportPeriod, SalesPage, SubscriptionPlan,
    UserProfile,
};
use crate::services::api_client::envelope_message;
use crate::services::error::ApiError;
use crate::services::request::ApiRequest;
use crate::session::SessionStore;
use serde_json::{json, Value};

impl<S: SessionStore> SellerApi<'_, S> {
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.fetch(ApiRequest::get("/user/profile")).await
    }

    pub async fn update_profile(&self, changes: Value) -> Result<UserProfile, ApiError> {
        self.fetch(ApiRequest::put("/user/profile").json(changes)).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Option<String>, ApiError> {
        let body = self
            .send(ApiRequest::put("/user/password").json(json!({
                "currentPassword": current_password,
                "newPassword": new_password,
                "confirmPassword": confirm_password,
            })))
            .await?;
        Ok(envelope_message(&body))
    }

    pub async fn overview(&self, period: ReportPeriod) -> Result<Overview, ApiError> {
        self.fetch(ApiRequest::get("/seller/dashboard/overview").query("period", period.as_str()))
            .await
    }

    pub async fn sales_history(&self, page: u32, limit: u32) -> Result<SalesPage, ApiError> {
        self.fetch(
            ApiRequest::get("/seller/dashboard/sales")
                .query("page", page)
                .query("limit", limit),
        )
        .await
    }

    /// Plans offered to the seller, inactive ones removed.
    pub async fn subscriptions(&self) -> Result<Vec<SubscriptionPlan>, ApiError> {
        Ok(active_plans(
            self.fetch_list(ApiRequest::get("/subscription")).await?,
        ))
    }

    pub async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentIntent, ApiError> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.fetch(ApiRequest::post("/payment/create-payment").json(body))
            .await
    }

    pub async fn confirm_payment(&self, payment_intent_id: &str) -> Result<Value, ApiError> {
        self.send(
            ApiRequest::post("/payment/confirm-payment")
                .json(json!({ "paymentIntentId": payment_intent_id })),
        )
        .await
    }
}
