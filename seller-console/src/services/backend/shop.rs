use super::SellerApi;
use crate::models::Shop;
use crate::services::error::ApiError;
use crate::services::request::{ApiRequest, MultipartBody};
use crate::session::SessionStore;
use serde_json::Value;

impl<S: SessionStore> SellerApi<'_, S> {
    pub async fn my_shop(&self) -> Result<Shop, ApiError> {
        self.fetch(ApiRequest::get("/shop/my")).await
    }

    pub async fn update_my_shop(&self, form: MultipartBody) -> Result<Value, ApiError> {
        self.send(ApiRequest::put("/shop/my").multipart(form)).await
    }
}
