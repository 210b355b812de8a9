//! Buffered multipart submissions from the console's file forms.

use crate::services::FilePart;
use axum::extract::multipart::{Multipart, MultipartError};

/// Every field of a submitted `multipart/form-data` form, in order.
#[derive(Debug, Default)]
pub struct SubmittedForm {
    texts: Vec<(String, String)>,
    files: Vec<(String, FilePart)>,
}

impl SubmittedForm {
    /// Drain the request body. File inputs left empty by the browser are
    /// dropped.
    pub async fn read(multipart: &mut Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() || bytes.is_empty() {
                        continue;
                    }
                    tracing::debug!(field = %name, file_name = %file_name, size = bytes.len(), "Received file");
                    form.files.push((
                        name,
                        FilePart {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    ));
                }
                None => {
                    let value = field.text().await?;
                    form.texts.push((name, value));
                }
            }
        }

        Ok(form)
    }

    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.texts.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_file(mut self, name: &str, file: FilePart) -> Self {
        self.files.push((name.to_string(), file));
        self
    }

    /// First non-blank value of `name`, trimmed.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts(name).into_iter().next()
    }

    /// All non-blank values of `name`, trimmed.
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.texts
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.text(name), Some("true" | "on" | "1"))
    }

    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    pub fn files(&self, name: &str) -> Vec<FilePart> {
        self.files
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, f)| f.clone())
            .collect()
    }
}
