use super::error::{extract_error_message, ApiError};
use super::request::{ApiRequest, Attempt, RequestBody};
use super::retry::{decide, RetryDecision};
use crate::config::BackendSettings;
use crate::session::{RefreshedTokens, SessionError, SessionManager, SessionStore, TokenRefresher};
use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use service_core::observability::TracedClientExt;
use std::time::Duration;
use tracing::instrument;

/// HTTP client for the marketplace REST API.
///
/// Every authenticated call goes through [`ApiClient::execute`], which attaches
/// the stored bearer token and recovers from one expired access token by
/// refreshing it and replaying the request.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send `request` on behalf of the session, applying the refresh-and-replay
    /// policy on a 401.
    #[instrument(
        skip(self, session, request),
        fields(method = %request.method(), path = %request.path())
    )]
    pub async fn execute<S: SessionStore>(
        &self,
        session: &SessionManager<S>,
        request: ApiRequest,
    ) -> Result<Value, ApiError> {
        let mut request = request;

        loop {
            let token = session.access_token().await?;
            let response = self.dispatch(&request, token.as_deref()).await?;
            let status = response.status();

            let has_refresh_token = status == StatusCode::UNAUTHORIZED
                && session.refresh_token().await?.is_some();

            match decide(status, request.attempt(), has_refresh_token) {
                RetryDecision::Deliver => return self.deliver(response, request.attempt()).await,
                RetryDecision::ExpireSession => {
                    let message = read_error_message(response).await;
                    tracing::info!("401 without a refresh token, clearing session");
                    session.logout().await?;
                    counter!("seller_api_requests_total", "outcome" => "expired").increment(1);
                    return Err(ApiError::SessionExpired { message });
                }
                RetryDecision::RefreshAndReplay => {
                    // A failed refresh surfaces the original 401, not the
                    // refresh endpoint's reply.
                    let message = read_error_message(response).await;
                    match session.refresh(self).await {
                        Ok(_) => {
                            counter!("seller_api_token_refresh_total", "result" => "success")
                                .increment(1);
                            tracing::debug!("Replaying request with refreshed token");
                            request = request.replay();
                        }
                        Err(SessionError::Store(e)) => return Err(SessionError::Store(e).into()),
                        Err(e) => {
                            tracing::info!(error = %e, "Refresh failed, session expired");
                            counter!("seller_api_token_refresh_total", "result" => "failure")
                                .increment(1);
                            counter!("seller_api_requests_total", "outcome" => "expired")
                                .increment(1);
                            return Err(ApiError::SessionExpired { message });
                        }
                    }
                }
            }
        }
    }

    /// Send a request without a bearer token and without the retry policy.
    /// Used by the signed-out auth pages.
    #[instrument(
        skip(self, request),
        fields(method = %request.method(), path = %request.path())
    )]
    pub async fn execute_public(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let response = self.dispatch(&request, None).await?;
        self.deliver(response, Attempt::First).await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = self.url(request.path());
        let mut builder = self.client.traced(request.method().clone(), &url);

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(body) => builder.multipart(body.to_form()?),
        };

        builder.send().await.map_err(|e| {
            tracing::error!("Failed to send {} request to {}: {}", request.method(), url, e);
            counter!("seller_api_requests_total", "outcome" => "network_error").increment(1);
            ApiError::Network(e)
        })
    }

    async fn deliver(&self, response: Response, attempt: Attempt) -> Result<Value, ApiError> {
        let status = response.status();

        if status.is_success() {
            counter!("seller_api_requests_total", "outcome" => "ok").increment(1);
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let message = read_error_message(response).await;
        if status == StatusCode::UNAUTHORIZED && attempt == Attempt::Replay {
            tracing::warn!("Replayed request rejected with 401");
            counter!("seller_api_requests_total", "outcome" => "unauthorized").increment(1);
            return Err(ApiError::Unauthorized { message });
        }

        tracing::debug!(status = %status, message = ?message, "Backend returned an error");
        counter!("seller_api_requests_total", "outcome" => "http_error").increment(1);
        Err(ApiError::Http { status, message })
    }
}

async fn read_error_message(response: Response) -> Option<String> {
    let body: Value = response.json().await.ok()?;
    extract_error_message(&body)
}

/// Decode the `data` member of a `{ success, message, data }` envelope, or the
/// whole body when there is no envelope.
pub fn unwrap_data<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    let payload = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The `message` member of an envelope, if any.
pub fn envelope_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl TokenRefresher for ApiClient {
    /// Sent outside the pipeline: a refresh is never itself refreshed.
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<RefreshedTokens, ApiError> {
        let url = self.url("/auth/refresh-token");
        let response = self
            .client
            .traced_post(&url)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = read_error_message(response).await;
            return Err(ApiError::Http { status, message });
        }

        unwrap_data(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_data_prefers_the_envelope_payload() {
        let body = json!({"success": true, "message": "ok", "data": {"accessToken": "T2"}});
        let tokens: RefreshedTokens = unwrap_data(body).unwrap();
        assert_eq!(tokens.access_token, "T2");
    }

    #[test]
    fn unwrap_data_accepts_bare_bodies() {
        let tokens: RefreshedTokens =
            unwrap_data(json!({"accessToken": "T2", "refreshToken": "R2"})).unwrap();
        assert_eq!(tokens.refresh_token.as_deref(), Some("R2"));
    }

    #[test]
    fn unwrap_data_reports_shape_mismatch() {
        let err = unwrap_data::<RefreshedTokens>(json!({"data": []})).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
