use super::SellerApi;
use crate::models::{ChatSummary, ChatThread, SendOptions};
use crate::services::error::ApiError;
use crate::services::request::{ApiRequest, FilePart, MultipartBody};
use crate::session::SessionStore;
use serde_json::{json, Value};

impl<S: SessionStore> SellerApi<'_, S> {
    pub async fn my_customers(&self) -> Result<Vec<ChatSummary>, ApiError> {
        self.fetch_list(ApiRequest::get("/chat/my-customers")).await
    }

    pub async fn chat(&self, chat_id: &str) -> Result<ChatThread, ApiError> {
        self.fetch(ApiRequest::get(format!("/chat/{chat_id}"))).await
    }

    /// JSON when there is nothing to upload, multipart otherwise.
    pub async fn send_message(
        &self,
        chat_id: &str,
        message: &str,
        attachments: Vec<FilePart>,
        options: SendOptions,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/chat/message");

        if attachments.is_empty() {
            let mut body = json!({ "chatId": chat_id, "message": message });
            if let Some(ask_price) = options.ask_price {
                body["askPrice"] = json!(ask_price);
            }
            if let Some(product_id) = options.product_id {
                body["productId"] = json!(product_id);
            }
            return self.send(request.json(body)).await;
        }

        let mut form = MultipartBody::new()
            .text("chatId", chat_id)
            .text_if_present("message", Some(message));
        if let Some(ask_price) = options.ask_price {
            form = form.text("askPrice", ask_price.to_string());
        }
        form = form.text_if_present("productId", options.product_id.as_deref());
        for file in attachments {
            form = form.file("files", file);
        }

        self.send(request.multipart(form)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::test_support::signed_in;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[tokio::test]
    async fn text_only_message_is_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/message"))
            .and(body_json(json!({"chatId": "c1", "message": "hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let (client, session) = signed_in(&server.uri()).await;
        SellerApi::new(&client, &session)
            .send_message("c1", "hello", Vec::new(), SendOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn attachments_switch_to_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/message"))
            .respond_with(|req: &Request| {
                let body = String::from_utf8_lossy(&req.body).to_string();
                let ok = body.contains("form-data; name=\"chatId\"")
                    && body.contains("form-data; name=\"files\"; filename=\"clip.mp4\"")
                    && !body.contains("name=\"message\"");
                ResponseTemplate::new(if ok { 201 } else { 400 })
            })
            .expect(1)
            .mount(&server)
            .await;

        let (client, session) = signed_in(&server.uri()).await;
        let clip = FilePart {
            file_name: "clip.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            bytes: vec![0; 16],
        };
        SellerApi::new(&client, &session)
            .send_message("c1", "", vec![clip], SendOptions::default())
            .await
            .unwrap();
    }
}
