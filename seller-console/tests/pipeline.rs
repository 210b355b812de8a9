//! Bearer attachment and the one-shot refresh-and-replay policy, exercised
//! against a mock backend.

use seller_console::config::BackendSettings;
use seller_console::services::{ApiClient, ApiError, ApiRequest, FilePart, MultipartBody};
use seller_console::session::store::{ACCESS_TOKEN, REFRESH_TOKEN};
use seller_console::session::{
    CachedProfile, LoginGrant, MemoryStore, SessionManager, SessionStore,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn grant() -> LoginGrant {
    LoginGrant {
        access_token: "T1".to_string(),
        refresh_token: "R1".to_string(),
        user_id: "U1".to_string(),
        role: "seller".to_string(),
        profile: CachedProfile {
            id: "U1".to_string(),
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            role: "seller".to_string(),
        },
    }
}

async fn signed_in(server: &MockServer) -> (ApiClient, SessionManager<MemoryStore>) {
    let client = ApiClient::new(&BackendSettings::new(server.uri())).unwrap();
    let session = SessionManager::new(MemoryStore::new());
    session.login(&grant()).await.unwrap();
    (client, session)
}

async fn mount_refresh(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(body_json(json!({"refreshToken": "R1"})))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

fn refreshed() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "data": {"accessToken": "T2", "refreshToken": "R2"}
    }))
}

#[tokio::test]
async fn valid_token_is_sent_once_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"_id": "U1"}})))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, refreshed(), 0).await;

    let (client, session) = signed_in(&server).await;
    let body = client
        .execute(&session, ApiRequest::get("/user/profile"))
        .await
        .unwrap();

    assert_eq!(body["data"]["_id"], "U1");
    assert_eq!(session.access_token().await.unwrap().as_deref(), Some("T1"));
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_replayed_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/order/seller-orders"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/order/seller-orders"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, refreshed(), 1).await;

    let (client, session) = signed_in(&server).await;
    let body = client
        .execute(&session, ApiRequest::get("/order/seller-orders"))
        .await
        .unwrap();

    assert_eq!(body, json!({"data": []}));
    assert_eq!(session.access_token().await.unwrap().as_deref(), Some("T2"));
    assert_eq!(session.refresh_token().await.unwrap().as_deref(), Some("R2"));
}

#[tokio::test]
async fn second_401_is_surfaced_without_another_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop/my-shop"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shop/my-shop"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Forbidden shop"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, refreshed(), 1).await;

    let (client, session) = signed_in(&server).await;
    let err = client
        .execute(&session, ApiRequest::get("/shop/my-shop"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(err.user_message("Failed"), "Forbidden shop");
    // The refreshed credentials stay; only a failed refresh clears the session.
    assert_eq!(session.access_token().await.unwrap().as_deref(), Some("T2"));
}

#[tokio::test]
async fn missing_refresh_token_clears_the_session_without_replay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, refreshed(), 0).await;

    let client = ApiClient::new(&BackendSettings::new(server.uri())).unwrap();
    let store = MemoryStore::new();
    store.insert(ACCESS_TOKEN, "T1".to_string()).await.unwrap();
    let session = SessionManager::new(store.clone());

    let err = client
        .execute(&session, ApiRequest::get("/user/profile"))
        .await
        .unwrap_err();

    assert!(err.is_session_expired());
    assert!(store.is_empty());
}

#[tokio::test]
async fn rejected_refresh_clears_the_session_and_keeps_the_original_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({"message": "Refresh token expired"})),
        1,
    )
    .await;

    let (client, session) = signed_in(&server).await;
    let err = client
        .execute(&session, ApiRequest::get("/user/profile"))
        .await
        .unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(err.user_message("Session expired"), "jwt expired");
    assert!(session.read().await.unwrap().is_none());
    assert!(session.store().get(REFRESH_TOKEN).await.unwrap().is_none());
}

#[tokio::test]
async fn multipart_upload_is_rebuilt_for_the_replay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/product/add"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/product/add"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, refreshed(), 1).await;

    let (client, session) = signed_in(&server).await;
    let body = MultipartBody::new().text("title", "Mango").file(
        "thumbnail",
        FilePart {
            file_name: "mango.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        },
    );
    client
        .execute(&session, ApiRequest::post("/product/add").multipart(body))
        .await
        .unwrap();

    let uploads: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|req| req.url.path() == "/product/add")
        .collect();
    assert_eq!(uploads.len(), 2);
    for upload in uploads {
        let text = String::from_utf8_lossy(&upload.body);
        assert!(text.contains("mango.png"));
        assert!(text.contains("Mango"));
    }
}

#[tokio::test]
async fn non_401_errors_pass_through_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/product/P1"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"success": false, "message": "SKU taken"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, refreshed(), 0).await;

    let (client, session) = signed_in(&server).await;
    let err = client
        .execute(&session, ApiRequest::put("/product/P1"))
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert_eq!(err.user_message("Failed to update product"), "SKU taken");
    assert!(session.read().await.unwrap().is_some());
}
