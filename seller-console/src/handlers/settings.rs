use super::forms::{
    check_new_password, first_message, ChangePasswordForm, ConfirmPaymentForm, PaymentForm,
    PASSWORD_MISMATCH,
};
use super::{fail, loaded, notify, reject, seller_api, session_expired, succeed, Layout};
use crate::models::{AuthUser, BillingPeriod, CreatePaymentRequest, PaymentIntent, SubscriptionPlan, UserProfile};
use crate::session::Notice;
use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde_json::{json, Value};
use service_core::error::AppError;
use validator::Validate;

const SETTINGS_PATH: &str = "/dashboard/settings";

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub layout: Layout,
    pub profile: UserProfile,
    pub plans: Vec<SubscriptionPlan>,
    pub publishable_key: Option<String>,
}

pub async fn settings_page(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
) -> Response {
    let mut layout = Layout::new(&user, "settings").await;
    let api = seller_api(&state, &user);

    let Some(profile) = loaded(api.profile().await, "Failed to load profile", &mut layout) else {
        return session_expired(user.session.store(), &headers).await;
    };
    let Some(plans) = loaded(
        api.subscriptions().await,
        "Failed to load subscription plans",
        &mut layout,
    ) else {
        return session_expired(user.session.store(), &headers).await;
    };

    SettingsTemplate {
        layout,
        profile,
        plans,
        publishable_key: state.settings.payments.publishable_key.clone(),
    }
    .into_response()
}

pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let invalid = match form.validate() {
        Err(errors) => Some(first_message(&errors)),
        Ok(()) => check_new_password(&form.new_password, &form.confirm_password)
            .err()
            .map(|message| match message {
                PASSWORD_MISMATCH => "New passwords do not match".to_string(),
                other => other.to_string(),
            }),
    };
    if let Some(message) = invalid {
        return reject(&user, &headers, &message, SETTINGS_PATH).await;
    }

    match seller_api(&state, &user)
        .change_password(
            &form.current_password,
            &form.new_password,
            &form.confirm_password,
        )
        .await
    {
        Ok(_) => succeed(&user, &headers, "Password changed successfully", SETTINGS_PATH).await,
        Err(e) => fail(&user, &headers, e, "Failed to change password", SETTINGS_PATH).await,
    }
}

/// Create a payment intent for a plan. The browser completes the card step
/// with the processor and then calls [`confirm_payment`].
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(form): Json<PaymentForm>,
) -> Result<Json<PaymentIntent>, AppError> {
    form.validate()?;
    let Some(user_id) = user.user_id.as_deref() else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "User profile not loaded. Please try again."
        )));
    };

    let period = form
        .billing_period
        .as_deref()
        .and_then(|p| p.parse::<BillingPeriod>().ok())
        .unwrap_or_default();

    let api = seller_api(&state, &user);
    let plans = api.subscriptions().await?;
    let plan = plans
        .iter()
        .find(|plan| plan.id == form.plan_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Plan not found")))?;

    let request = CreatePaymentRequest::subscription(user_id, plan, period);
    if request.price <= 0.0 {
        return Err(AppError::BadRequest(anyhow::anyhow!("Invalid plan price.")));
    }

    let intent = api.create_payment(&request).await?;
    tracing::info!(plan_id = %plan.id, period = ?period, "Payment intent created");
    Ok(Json(intent))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(form): Json<ConfirmPaymentForm>,
) -> Result<Json<Value>, AppError> {
    form.validate()?;
    seller_api(&state, &user)
        .confirm_payment(&form.payment_intent_id)
        .await?;

    tracing::info!(payment_intent_id = %form.payment_intent_id, "Payment confirmed");
    notify(
        user.session.store(),
        Notice::success("Payment completed successfully"),
    )
    .await;
    Ok(Json(json!({ "message": "Payment completed successfully" })))
}
