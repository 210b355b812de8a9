//! Typed calls for every backend resource the console uses.

mod account;
mod auth;
mod catalog;
mod chat;
mod orders;
mod shop;

use super::api_client::{unwrap_data, ApiClient};
use super::error::ApiError;
use super::request::ApiRequest;
use crate::session::{SessionManager, SessionStore};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Backend calls made on behalf of one session.
pub struct SellerApi<'a, S> {
    client: &'a ApiClient,
    session: &'a SessionManager<S>,
}

impl<'a, S: SessionStore> SellerApi<'a, S> {
    pub fn new(client: &'a ApiClient, session: &'a SessionManager<S>) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &SessionManager<S> {
        self.session
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        unwrap_data(self.client.execute(self.session, request).await?)
    }

    /// Lists tolerate a missing or non-array `data` and read as empty.
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Vec<T>, ApiError> {
        let body = self.client.execute(self.session, request).await?;
        match body.get("data") {
            Some(Value::Array(_)) => unwrap_data(body),
            Some(_) => Ok(Vec::new()),
            None if body.is_array() => unwrap_data(body),
            None => Ok(Vec::new()),
        }
    }

    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.client.execute(self.session, request).await
    }
}
