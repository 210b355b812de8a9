use super::forms::PageQuery;
use super::upload::SubmittedForm;
use super::{fail, loaded, reject, seller_api, session_expired, succeed, Layout};
use crate::middleware::auth::redirect;
use crate::models::catalog::{resolve_category, subcategories, Photo};
use crate::models::{AuthUser, Category, Product};
use crate::services::{ApiError, MultipartBody, SellerApi};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tower_sessions::Session;

pub const PAGE_SIZE: u32 = 10;
const PRODUCTS_PATH: &str = "/dashboard/products";
const ADD_PRODUCT_PATH: &str = "/dashboard/products/add";
const FILL_REQUIRED: &str = "Please fill in all required fields";
const SHOP_NOT_FOUND: &str = "Shop not found. Please contact support.";

#[derive(Template)]
#[template(path = "products/list.html")]
pub struct ProductsTemplate {
    pub layout: Layout,
    pub products: Vec<Product>,
    pub page: u32,
    pub has_next: bool,
}

#[derive(Template)]
#[template(path = "products/pending.html")]
pub struct PendingProductsTemplate {
    pub layout: Layout,
    pub products: Vec<Product>,
}

#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub view: ProductFormView,
    pub categories: Vec<Category>,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit,
}

/// Values the add/edit form is pre-filled with.
#[derive(Debug, Default)]
pub struct ProductFormView {
    pub heading: &'static str,
    pub action: String,
    pub editing: bool,
    pub title: String,
    pub price: String,
    pub stock: String,
    pub sku: String,
    pub description: String,
    pub country: String,
    pub colors: String,
    pub category: String,
    pub subcategory: String,
    pub thumbnail_url: Option<String>,
    pub photos: Vec<Photo>,
}

impl ProductFormView {
    fn blank() -> Self {
        Self {
            heading: "Add Product",
            action: ADD_PRODUCT_PATH.to_string(),
            ..Self::default()
        }
    }

    fn for_product(product: &Product, categories: &[Category]) -> Self {
        let (category, subcategory) = resolve_category(categories, product.category_id());
        Self {
            heading: "Edit Product",
            action: format!("{PRODUCTS_PATH}/{}/edit", product.id),
            editing: true,
            title: product.title.clone(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
            sku: product.sku.clone(),
            description: product.description_text().to_string(),
            country: product.country.clone(),
            colors: product.lowercase_colors().join(","),
            category,
            subcategory: subcategory.unwrap_or_default(),
            thumbnail_url: product.thumbnail_url().map(str::to_string),
            photos: product
                .photos
                .iter()
                .filter(|p| !p.url.is_empty())
                .cloned()
                .collect(),
        }
    }
}

/// Check a submitted product form. Editing additionally needs a SKU and,
/// when the category has sub-categories, one of them.
pub fn check_product(
    form: &SubmittedForm,
    mode: FormMode,
    categories: &[Category],
) -> Result<(), &'static str> {
    let mut required = vec!["title", "price", "stock", "category", "country"];
    if mode == FormMode::Edit {
        required.push("sku");
    }
    if required.iter().any(|field| form.text(field).is_none()) {
        return Err(FILL_REQUIRED);
    }

    if mode == FormMode::Edit {
        let category = form.text("category").unwrap_or_default();
        if !subcategories(categories, category).is_empty() && form.text("subcategory").is_none() {
            return Err("Please select a subcategory");
        }
    }
    Ok(())
}

/// Multipart body sent to the backend for a checked form.
pub fn product_body(form: &SubmittedForm, shop_id: &str, mode: FormMode) -> MultipartBody {
    let text = |name: &str| form.text(name).unwrap_or_default().to_string();

    let mut body = MultipartBody::new()
        .text("shopId", shop_id)
        .text("title", text("title"))
        .text("price", text("price"))
        .text("stock", text("stock"))
        .text("category", text("category"))
        .text_if_present("subcategory", form.text("subcategory"))
        .text("country", text("country"))
        .text("sku", text("sku"))
        .text("detailedDescription", text("description"));

    let colors: Vec<String> = form
        .texts("colors")
        .iter()
        .flat_map(|value| value.split(','))
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    if !colors.is_empty() {
        body = body.text("colors", colors.join(","));
    }

    if let Some(thumbnail) = form.file("thumbnail") {
        body = body.file("thumbnail", thumbnail.clone());
    }
    for photo in form.files("photos") {
        body = body.file("photos", photo);
    }

    if mode == FormMode::Edit {
        let removed = form.texts("removedPhotos");
        if !removed.is_empty() {
            body = body.text("removedPhotos", Value::from(removed).to_string());
        }
        if form.flag("removeThumbnail") && form.file("thumbnail").is_none() {
            body = body.text("removeThumbnail", "true");
        }
    }

    body
}

fn country_names(countries: Value) -> Vec<String> {
    countries
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|c| c.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

async fn load_countries(state: &AppState) -> Vec<String> {
    match state.countries.get().await {
        Ok(countries) => country_names(countries),
        Err(e) => {
            tracing::warn!(error = %e, "Country list unavailable");
            Vec::new()
        }
    }
}

/// The seller's shop id from their profile. `Ok(None)` when they have none.
async fn shop_id(api: &SellerApi<'_, Session>) -> Result<Option<String>, ApiError> {
    Ok(api.profile().await?.shop_id().map(str::to_string))
}

pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let mut layout = Layout::new(&user, "products").await;
    let page = query.page();
    let api = seller_api(&state, &user);

    let Some(products) = loaded(
        api.my_products(page, PAGE_SIZE).await,
        "Failed to load products",
        &mut layout,
    ) else {
        return session_expired(user.session.store(), &headers).await;
    };

    ProductsTemplate {
        layout,
        has_next: products.len() as u32 >= PAGE_SIZE,
        products,
        page,
    }
    .into_response()
}

/// Pending approvals have no backend listing yet; the page is always empty.
pub async fn pending_products(user: AuthUser) -> impl IntoResponse {
    PendingProductsTemplate {
        layout: Layout::new(&user, "pending-products").await,
        products: Vec::new(),
    }
}

pub async fn add_product_page(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
) -> Response {
    let mut layout = Layout::new(&user, "products").await;
    let api = seller_api(&state, &user);

    let Some(categories) = loaded(
        api.categories().await,
        "Failed to load categories",
        &mut layout,
    ) else {
        return session_expired(user.session.store(), &headers).await;
    };

    ProductFormTemplate {
        layout,
        view: ProductFormView::blank(),
        categories,
        countries: load_countries(&state).await,
    }
    .into_response()
}

pub async fn add_product_handler(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let form = match SubmittedForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable product form");
            return reject(&user, &headers, "Failed to read the submitted form", ADD_PRODUCT_PATH)
                .await;
        }
    };

    if let Err(message) = check_product(&form, FormMode::Add, &[]) {
        return reject(&user, &headers, message, ADD_PRODUCT_PATH).await;
    }

    let api = seller_api(&state, &user);
    let shop_id = match shop_id(&api).await {
        Ok(Some(id)) => id,
        Ok(None) => return reject(&user, &headers, SHOP_NOT_FOUND, ADD_PRODUCT_PATH).await,
        Err(e) => return fail(&user, &headers, e, SHOP_NOT_FOUND, ADD_PRODUCT_PATH).await,
    };

    match api
        .add_product(product_body(&form, &shop_id, FormMode::Add))
        .await
    {
        Ok(_) => {
            tracing::info!(shop_id = %shop_id, "Product added");
            succeed(&user, &headers, "Product added successfully", PRODUCTS_PATH).await
        }
        Err(e) => fail(&user, &headers, e, "Failed to add product", ADD_PRODUCT_PATH).await,
    }
}

pub async fn edit_product_page(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let api = seller_api(&state, &user);

    let product = match api.product(&id).await {
        Ok(product) => product,
        Err(e) => return fail(&user, &headers, e, "Failed to load product", PRODUCTS_PATH).await,
    };

    let mut layout = Layout::new(&user, "products").await;
    let Some(categories) = loaded(
        api.categories().await,
        "Failed to load categories",
        &mut layout,
    ) else {
        return session_expired(user.session.store(), &headers).await;
    };

    ProductFormTemplate {
        layout,
        view: ProductFormView::for_product(&product, &categories),
        categories,
        countries: load_countries(&state).await,
    }
    .into_response()
}

pub async fn edit_product_handler(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let back = format!("{PRODUCTS_PATH}/{id}/edit");
    let form = match SubmittedForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable product form");
            return reject(&user, &headers, "Failed to read the submitted form", &back).await;
        }
    };

    let api = seller_api(&state, &user);
    let categories = match api.categories().await {
        Ok(categories) => categories,
        Err(e) if e.is_session_expired() => {
            return session_expired(user.session.store(), &headers).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Categories unavailable, skipping sub-category check");
            Vec::new()
        }
    };

    if let Err(message) = check_product(&form, FormMode::Edit, &categories) {
        return reject(&user, &headers, message, &back).await;
    }

    let shop_id = match shop_id(&api).await {
        Ok(Some(id)) => id,
        Ok(None) => return reject(&user, &headers, SHOP_NOT_FOUND, &back).await,
        Err(e) => return fail(&user, &headers, e, SHOP_NOT_FOUND, &back).await,
    };

    match api
        .update_product(&id, product_body(&form, &shop_id, FormMode::Edit))
        .await
    {
        Ok(_) => {
            tracing::info!(product_id = %id, "Product updated");
            succeed(&user, &headers, "Product updated successfully", PRODUCTS_PATH).await
        }
        Err(e) => fail(&user, &headers, e, "Failed to update product", &back).await,
    }
}

pub async fn delete_product_handler(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    match seller_api(&state, &user).delete_product(&id).await {
        Ok(_) => {
            tracing::info!(product_id = %id, "Product deleted");
            succeed(&user, &headers, "Product deleted successfully", PRODUCTS_PATH).await
        }
        Err(e) => fail(&user, &headers, e, "Failed to delete product", PRODUCTS_PATH).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::request::Part;
    use crate::services::FilePart;
    use serde_json::json;

    fn categories() -> Vec<Category> {
        serde_json::from_value(json!([
            {"_id": "C1", "name": "Fruit", "children": [
                {"_id": "S1", "name": "Citrus", "parent": "C1"}
            ]},
            {"_id": "C2", "name": "Grain"}
        ]))
        .unwrap()
    }

    fn complete() -> SubmittedForm {
        SubmittedForm::default()
            .with_text("title", "Mango")
            .with_text("price", "4.5")
            .with_text("stock", "12")
            .with_text("category", "C1")
            .with_text("country", "Kenya")
    }

    #[test]
    fn add_requires_the_core_fields() {
        assert_eq!(check_product(&complete(), FormMode::Add, &[]), Ok(()));

        let missing = SubmittedForm::default().with_text("title", "Mango");
        assert_eq!(
            check_product(&missing, FormMode::Add, &[]),
            Err(FILL_REQUIRED)
        );
    }

    #[test]
    fn edit_requires_sku_and_subcategory() {
        let cats = categories();
        assert_eq!(
            check_product(&complete(), FormMode::Edit, &cats),
            Err(FILL_REQUIRED)
        );

        let with_sku = complete().with_text("sku", "MG-1");
        assert_eq!(
            check_product(&with_sku, FormMode::Edit, &cats),
            Err("Please select a subcategory")
        );

        let chosen = complete()
            .with_text("sku", "MG-1")
            .with_text("subcategory", "S1");
        assert_eq!(check_product(&chosen, FormMode::Edit, &cats), Ok(()));
    }

    #[test]
    fn edit_body_carries_removals_and_colors() {
        let form = complete()
            .with_text("sku", "MG-1")
            .with_text("description", "Sweet")
            .with_text("colors", "Red, GREEN")
            .with_text("removedPhotos", "pub-1")
            .with_text("removedPhotos", "pub-2")
            .with_text("removeThumbnail", "on");

        let body = product_body(&form, "SH1", FormMode::Edit);

        assert_eq!(body.text_value("shopId"), Some("SH1"));
        assert_eq!(body.text_value("detailedDescription"), Some("Sweet"));
        assert_eq!(body.text_value("colors"), Some("red,green"));
        assert_eq!(body.text_value("removedPhotos"), Some(r#"["pub-1","pub-2"]"#));
        assert_eq!(body.text_value("removeThumbnail"), Some("true"));
        assert_eq!(body.text_value("subcategory"), None);
    }

    #[test]
    fn a_new_thumbnail_overrides_its_removal() {
        let thumbnail = FilePart {
            file_name: "t.png".into(),
            content_type: "image/png".into(),
            bytes: vec![1],
        };
        let form = complete()
            .with_text("removeThumbnail", "on")
            .with_file("thumbnail", thumbnail);

        let body = product_body(&form, "SH1", FormMode::Edit);

        assert_eq!(body.text_value("removeThumbnail"), None);
        assert!(body
            .parts()
            .iter()
            .any(|p| matches!(p, Part::File { name, .. } if name == "thumbnail")));
    }

    #[test]
    fn add_body_ignores_edit_only_fields() {
        let form = complete().with_text("removedPhotos", "pub-1");
        let body = product_body(&form, "SH1", FormMode::Add);
        assert_eq!(body.text_value("removedPhotos"), None);
    }

    #[test]
    fn edit_view_resolves_subcategory_to_its_parent() {
        let product: Product = serde_json::from_value(json!({
            "_id": "P1",
            "title": "Lemon",
            "price": 2,
            "stock": 5,
            "category": {"_id": "S1", "name": "Citrus"},
            "colors": ["Yellow"],
            "photos": [{"url": "https://img/1.png", "public_id": "pub-1"}, {"url": ""}]
        }))
        .unwrap();

        let view = ProductFormView::for_product(&product, &categories());

        assert_eq!(view.category, "C1");
        assert_eq!(view.subcategory, "S1");
        assert_eq!(view.colors, "yellow");
        assert_eq!(view.photos.len(), 1);
        assert_eq!(view.action, "/dashboard/products/P1/edit");
    }

    #[test]
    fn country_names_skip_unnamed_entries() {
        let names = country_names(json!([{"name": "Chad"}, {"code": "XX"}, {"name": "Peru"}]));
        assert_eq!(names, vec!["Chad", "Peru"]);
        assert!(country_names(json!({"error": true})).is_empty());
    }
}
