//! Authorization retry policy for backend calls.
//!
//! Only a 401 on a first attempt is ever retried, and only through one token
//! refresh. Everything else passes straight through to the caller.

use super::request::Attempt;
use reqwest::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Hand the response (success or error) to the caller as is.
    Deliver,
    /// Refresh the access token once, then replay the request once.
    RefreshAndReplay,
    /// Nothing to refresh with: clear the session and surface the error.
    ExpireSession,
}

pub fn decide(status: StatusCode, attempt: Attempt, has_refresh_token: bool) -> RetryDecision {
    if status != StatusCode::UNAUTHORIZED {
        return RetryDecision::Deliver;
    }

    match (attempt, has_refresh_token) {
        (Attempt::Replay, _) => RetryDecision::Deliver,
        (Attempt::First, false) => RetryDecision::ExpireSession,
        (Attempt::First, true) => RetryDecision::RefreshAndReplay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_401_statuses_are_delivered() {
        for status in [
            StatusCode::OK,
            StatusCode::BAD_REQUEST,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert_eq!(decide(status, Attempt::First, true), RetryDecision::Deliver);
        }
    }

    #[test]
    fn first_401_with_refresh_token_refreshes() {
        assert_eq!(
            decide(StatusCode::UNAUTHORIZED, Attempt::First, true),
            RetryDecision::RefreshAndReplay
        );
    }

    #[test]
    fn first_401_without_refresh_token_expires() {
        assert_eq!(
            decide(StatusCode::UNAUTHORIZED, Attempt::First, false),
            RetryDecision::ExpireSession
        );
    }

    #[test]
    fn replayed_401_is_never_refreshed_again() {
        assert_eq!(
            decide(StatusCode::UNAUTHORIZED, Attempt::Replay, true),
            RetryDecision::Deliver
        );
    }
}
