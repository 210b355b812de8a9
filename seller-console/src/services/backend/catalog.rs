use super::SellerApi;
use crate::models::{Category, Product};
use crate::services::error::ApiError;
use crate::services::request::{ApiRequest, MultipartBody};
use crate::session::SessionStore;
use serde_json::Value;

impl<S: SessionStore> SellerApi<'_, S> {
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.fetch_list(ApiRequest::get("/category")).await
    }

    pub async fn my_products(&self, page: u32, limit: u32) -> Result<Vec<Product>, ApiError> {
        self.fetch_list(
            ApiRequest::get("/product/my")
                .query("page", page)
                .query("limit", limit),
        )
        .await
    }

    pub async fn product(&self, id: &str) -> Result<Product, ApiError> {
        self.fetch(ApiRequest::get(format!("/product/{id}"))).await
    }

    pub async fn add_product(&self, form: MultipartBody) -> Result<Value, ApiError> {
        self.send(ApiRequest::post("/product/add").multipart(form))
            .await
    }

    pub async fn update_product(&self, id: &str, form: MultipartBody) -> Result<Value, ApiError> {
        self.send(ApiRequest::put(format!("/product/{id}")).multipart(form))
            .await
    }

    pub async fn delete_product(&self, id: &str) -> Result<Value, ApiError> {
        self.send(ApiRequest::delete(format!("/product/{id}"))).await
    }
}
