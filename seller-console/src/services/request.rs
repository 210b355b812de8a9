//! Replayable request values for the backend pipeline.

use reqwest::{multipart, Method};
use serde_json::Value;

/// Which send this is. A request value never changes its own attempt; a
/// replay is a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Replay,
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Part {
    Text { name: String, value: String },
    File { name: String, file: FilePart },
}

/// Owned multipart body, rebuilt into a fresh `reqwest` form per send so the
/// same upload can be replayed after a token refresh.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    parts: Vec<Part>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a text part only when `value` is non-empty.
    pub fn text_if_present(self, name: impl Into<String>, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    pub fn file(mut self, name: impl Into<String>, file: FilePart) -> Self {
        self.parts.push(Part::File {
            name: name.into(),
            file,
        });
        self
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn has_files(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::File { .. }))
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn to_form(&self) -> Result<multipart::Form, reqwest::Error> {
        let mut form = multipart::Form::new();
        for part in &self.parts {
            form = match part {
                Part::Text { name, value } => form.text(name.clone(), value.clone()),
                Part::File { name, file } => {
                    let body = multipart::Part::bytes(file.bytes.clone())
                        .file_name(file.file_name.clone())
                        .mime_str(&file.content_type)?;
                    form.part(name.clone(), body)
                }
            };
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartBody),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    attempt: Attempt,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            attempt: Attempt::First,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }

    /// The same request, marked as the one permitted replay.
    pub fn replay(&self) -> Self {
        Self {
            attempt: Attempt::Replay,
            ..self.clone()
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replay_copies_everything_but_the_attempt() {
        let original = ApiRequest::patch("/order/O1/status")
            .query("page", 2)
            .json(json!({"status": "shipped"}));
        let replay = original.replay();

        assert_eq!(original.attempt(), Attempt::First);
        assert_eq!(replay.attempt(), Attempt::Replay);
        assert_eq!(replay.method(), &Method::PATCH);
        assert_eq!(replay.path(), "/order/O1/status");
        assert_eq!(replay.query_pairs(), &[("page".to_string(), "2".to_string())]);
        assert!(matches!(replay.body(), RequestBody::Json(v) if v["status"] == "shipped"));
    }

    #[test]
    fn blank_optional_parts_are_skipped() {
        let body = MultipartBody::new()
            .text("name", "Corner Shop")
            .text_if_present("address", Some("  "))
            .text_if_present("description", None);

        assert_eq!(body.parts().len(), 1);
        assert_eq!(body.text_value("name"), Some("Corner Shop"));
        assert!(!body.has_files());
    }
}
