use super::upload::SubmittedForm;
use super::{fail, loaded, reject, seller_api, session_expired, succeed, Layout};
use crate::models::{AuthUser, Shop};
use crate::services::MultipartBody;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};

const SHOP_PATH: &str = "/dashboard/shop";

#[derive(Template)]
#[template(path = "shop.html")]
pub struct ShopTemplate {
    pub layout: Layout,
    pub shop: Shop,
}

/// Only the fields the seller filled in are sent; the logo is optional.
pub fn shop_body(form: &SubmittedForm) -> MultipartBody {
    let mut body = MultipartBody::new()
        .text_if_present("name", form.text("name"))
        .text_if_present("address", form.text("address"))
        .text_if_present("description", form.text("description"));
    if let Some(logo) = form.file("logo") {
        body = body.file("logo", logo.clone());
    }
    body
}

pub async fn shop_page(State(state): State<AppState>, user: AuthUser, headers: HeaderMap) -> Response {
    let mut layout = Layout::new(&user, "shop").await;

    let Some(shop) = loaded(
        seller_api(&state, &user).my_shop().await,
        "Failed to load shop",
        &mut layout,
    ) else {
        return session_expired(user.session.store(), &headers).await;
    };

    ShopTemplate { layout, shop }.into_response()
}

pub async fn update_shop(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let form = match SubmittedForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable shop form");
            return reject(&user, &headers, "Failed to read the submitted form", SHOP_PATH).await;
        }
    };

    let body = shop_body(&form);
    if body.is_empty() {
        return reject(&user, &headers, "Nothing to update", SHOP_PATH).await;
    }

    match seller_api(&state, &user).update_my_shop(body).await {
        Ok(_) => succeed(&user, &headers, "Shop updated successfully", SHOP_PATH).await,
        Err(e) => fail(&user, &headers, e, "Failed to update shop", SHOP_PATH).await,
    }
}
