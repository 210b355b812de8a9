//! W3C Trace Context propagation for outbound calls to the marketplace backend.
//!
//! Every request the console sends downstream carries `traceparent` (and
//! `tracestate` when present) taken from the current span, so backend logs
//! line up with the console's request spans.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::HeaderMap;
use reqwest::{Method, multipart};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Header name for W3C traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header name for W3C tracestate
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Header name for request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inject current trace context into HTTP request headers.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let span = Span::current();
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if span_context.is_valid() {
        // version-trace_id-span_id-trace_flags
        let traceparent = format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        );

        if let Ok(value) = traceparent.parse() {
            headers.insert(TRACEPARENT_HEADER, value);
        }

        let tracestate = span_context.trace_state().header();
        if !tracestate.is_empty()
            && let Ok(value) = tracestate.parse()
        {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }
}

/// Extract a header value as an owned string.
fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract the traceparent header, if present.
pub fn extract_traceparent(headers: &HeaderMap) -> Option<String> {
    header_string(headers, TRACEPARENT_HEADER)
}

/// Extract the request ID header, if present.
pub fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    header_string(headers, REQUEST_ID_HEADER)
}

/// A reqwest builder that injects trace headers right before sending.
pub struct TracedRequest {
    request: reqwest::RequestBuilder,
}

impl TracedRequest {
    pub fn new(request: reqwest::RequestBuilder) -> Self {
        Self { request }
    }

    pub fn header(self, key: &str, value: &str) -> Self {
        Self {
            request: self.request.header(key, value),
        }
    }

    pub fn query<T: serde::Serialize + ?Sized>(self, query: &T) -> Self {
        Self {
            request: self.request.query(query),
        }
    }

    pub fn json<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        Self {
            request: self.request.json(json),
        }
    }

    pub fn multipart(self, form: multipart::Form) -> Self {
        Self {
            request: self.request.multipart(form),
        }
    }

    pub fn bearer_auth<T: std::fmt::Display>(self, token: T) -> Self {
        Self {
            request: self.request.bearer_auth(token),
        }
    }

    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);

        self.request.headers(headers).send().await
    }
}

/// Extension trait for reqwest::Client to create traced requests.
pub trait TracedClientExt {
    fn traced(&self, method: Method, url: &str) -> TracedRequest;

    fn traced_get(&self, url: &str) -> TracedRequest {
        self.traced(Method::GET, url)
    }

    fn traced_post(&self, url: &str) -> TracedRequest {
        self.traced(Method::POST, url)
    }
}

impl TracedClientExt for reqwest::Client {
    fn traced(&self, method: Method, url: &str) -> TracedRequest {
        TracedRequest::new(self.request(method, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_empty_context() {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        // No active span, nothing to propagate
        assert!(headers.is_empty());
    }

    #[test]
    fn test_extract_traceparent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            TRACEPARENT_HEADER,
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"
                .parse()
                .unwrap(),
        );

        assert_eq!(
            extract_traceparent(&headers),
            Some("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01".to_string())
        );
    }

    #[test]
    fn test_extract_request_id_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_request_id(&headers), None);
    }
}
