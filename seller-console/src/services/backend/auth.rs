use super::SellerApi;
use crate::models::LoginResponse;
use crate::services::api_client::{envelope_message, unwrap_data};
use crate::services::error::ApiError;
use crate::services::request::ApiRequest;
use crate::session::SessionStore;
use serde_json::json;

impl<S: SessionStore> SellerApi<'_, S> {
    /// Sign in and persist the returned tokens and identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request =
            ApiRequest::post("/auth/login").json(json!({ "email": email, "password": password }));
        let response: LoginResponse = unwrap_data(self.client.execute_public(request).await?)?;

        self.session.login(&response.clone().into_grant()).await?;
        Ok(response)
    }

    /// Ask the backend to e-mail a reset OTP. Returns the server's message.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
        let request = ApiRequest::post("/auth/forget").json(json!({ "email": email }));
        let body = self.client.execute_public(request).await?;
        Ok(envelope_message(&body))
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Option<String>, ApiError> {
        let request = ApiRequest::post("/auth/reset-password").json(json!({
            "email": email,
            "otp": otp,
            "password": password,
            "confirmPassword": confirm_password,
        }));
        let body = self.client.execute_public(request).await?;
        Ok(envelope_message(&body))
    }

    /// Exchange the stored refresh token for a new access token.
    pub async fn refresh_tokens(&self) -> Result<String, ApiError> {
        Ok(self.session.refresh(self.client).await?)
    }
}
