use crate::session::SessionError;
use reqwest::StatusCode;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// 401 on a replayed request; never triggers a second refresh.
    #[error("Unauthorized")]
    Unauthorized { message: Option<String> },

    /// The session could not be recovered and has been cleared.
    #[error("Session expired")]
    SessionExpired { message: Option<String> },

    #[error("HTTP {status}")]
    Http {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Text for the seller: the server's own message when it sent one,
    /// otherwise the caller's fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Validation(message) => message.clone(),
            ApiError::Unauthorized { message }
            | ApiError::SessionExpired { message }
            | ApiError::Http { message, .. } => {
                message.clone().unwrap_or_else(|| fallback.to_string())
            }
            ApiError::Network(_) | ApiError::Decode(_) | ApiError::Session(_) => {
                fallback.to_string()
            }
        }
    }

    /// Message the backend attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::SessionExpired { message }
            | ApiError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } | ApiError::SessionExpired { .. } => {
                Some(StatusCode::UNAUTHORIZED)
            }
            _ => None,
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(message) => AppError::BadRequest(anyhow::anyhow!(message)),
            ApiError::SessionExpired { .. } => AppError::SessionExpired,
            ApiError::Unauthorized { message } => AppError::Unauthorized(anyhow::anyhow!(
                message.unwrap_or_else(|| "Unauthorized".to_string())
            )),
            ApiError::Http { status, message } => AppError::Upstream(
                status,
                message.unwrap_or_else(|| "Request failed".to_string()),
            ),
            ApiError::Network(e) => AppError::BadGateway(e.to_string()),
            ApiError::Decode(message) => AppError::BadGateway(message),
            ApiError::Session(e) => AppError::InternalError(anyhow::Error::new(e)),
        }
    }
}

/// Pull the human-readable message out of an error body: `message` first,
/// then `error` (the payment endpoints use the latter).
pub fn extract_error_message(body: &serde_json::Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(|value| value.as_str())
        .filter(|message| !message.trim().is_empty())
        .map(|message| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_message_wins_over_fallback() {
        let err = ApiError::Http {
            status: StatusCode::BAD_REQUEST,
            message: extract_error_message(&json!({"success": false, "message": "SKU taken"})),
        };
        assert_eq!(err.user_message("Failed to add product"), "SKU taken");
    }

    #[test]
    fn fallback_used_without_server_message() {
        let err = ApiError::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: extract_error_message(&json!({"success": false})),
        };
        assert_eq!(err.user_message("Failed to update order"), "Failed to update order");
    }

    #[test]
    fn payment_error_field_is_recognised() {
        assert_eq!(
            extract_error_message(&json!({"error": "Card declined"})).as_deref(),
            Some("Card declined")
        );
    }
}
