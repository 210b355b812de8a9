use super::forms::{
    check_new_password, first_message, ForgotPasswordForm, LoginForm, OtpForm, ResetPasswordForm,
};
use super::{notify, take_notices};
use crate::middleware::auth::{login_redirect, redirect};
use crate::services::SellerApi;
use crate::session::{Notice, SessionManager};
use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form,
};
use tower_sessions::Session;
use validator::Validate;

const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
const ENTER_OTP_PATH: &str = "/auth/enter-otp";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub notices: Vec<Notice>,
}

#[derive(Template)]
#[template(path = "partials/form_error.html")]
pub struct FormErrorFragment {
    pub message: String,
}

#[derive(Template)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub notices: Vec<Notice>,
}

#[derive(Template)]
#[template(path = "auth/enter_otp.html")]
pub struct EnterOtpTemplate {
    pub notices: Vec<Notice>,
    pub email: String,
}

#[derive(Template)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub notices: Vec<Notice>,
    pub email: String,
}

fn form_error(message: impl Into<String>) -> Response {
    FormErrorFragment {
        message: message.into(),
    }
    .into_response()
}

pub async fn login_page(session: Session) -> impl IntoResponse {
    LoginTemplate {
        notices: take_notices(&session).await,
    }
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        return form_error(first_message(&errors));
    }

    let manager = SessionManager::new(session);
    let api = SellerApi::new(&state.api, &manager);

    match api.login(form.email.trim(), &form.password).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %user.role, "Seller logged in");
            notify(manager.store(), Notice::success("Login successful")).await;
            redirect(&headers, "/dashboard")
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            form_error(e.user_message("Login failed. Please try again."))
        }
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Response {
    if let Err(e) = state.channels.unmount_for(&session).await {
        tracing::error!(error = %e, "Failed to unmount realtime channel on logout");
    }

    let manager = SessionManager::new(session);
    if let Err(e) = manager.logout().await {
        tracing::error!(error = %e, "Failed to clear session");
    }

    notify(manager.store(), Notice::success("Logged out successfully")).await;
    login_redirect(&headers)
}

pub async fn forgot_password_page(session: Session) -> impl IntoResponse {
    ForgotPasswordTemplate {
        notices: take_notices(&session).await,
    }
}

pub async fn forgot_password_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let manager = SessionManager::new(session);

    if let Err(errors) = form.validate() {
        notify(manager.store(), Notice::error(first_message(&errors))).await;
        return redirect(&headers, FORGOT_PASSWORD_PATH);
    }

    let email = form.email.trim();
    let api = SellerApi::new(&state.api, &manager);
    match api.forgot_password(email).await {
        Ok(_) => {
            if let Err(e) = manager.remember_reset_email(email).await {
                tracing::error!(error = %e, "Failed to store reset email");
            }
            notify(manager.store(), Notice::success("OTP sent to your email")).await;
            redirect(&headers, ENTER_OTP_PATH)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Forgot password request failed");
            let message = e.user_message("Failed to send OTP. Please try again.");
            notify(manager.store(), Notice::error(message)).await;
            redirect(&headers, FORGOT_PASSWORD_PATH)
        }
    }
}

async fn reset_email(manager: &SessionManager<Session>) -> Option<String> {
    manager.reset_email().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to read reset email");
        None
    })
}

pub async fn enter_otp_page(session: Session, headers: HeaderMap) -> Response {
    let manager = SessionManager::new(session);
    let Some(email) = reset_email(&manager).await else {
        return redirect(&headers, FORGOT_PASSWORD_PATH);
    };

    EnterOtpTemplate {
        notices: take_notices(manager.store()).await,
        email,
    }
    .into_response()
}

pub async fn enter_otp_handler(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<OtpForm>,
) -> Response {
    let manager = SessionManager::new(session);
    if reset_email(&manager).await.is_none() {
        return redirect(&headers, FORGOT_PASSWORD_PATH);
    }

    let Some(otp) = form.code() else {
        notify(
            manager.store(),
            Notice::error("Please enter a valid 6-digit OTP"),
        )
        .await;
        return redirect(&headers, ENTER_OTP_PATH);
    };

    if let Err(e) = manager.remember_reset_otp(otp).await {
        tracing::error!(error = %e, "Failed to store reset OTP");
    }
    redirect(&headers, RESET_PASSWORD_PATH)
}

pub async fn resend_otp_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Response {
    let manager = SessionManager::new(session);
    let Some(email) = reset_email(&manager).await else {
        return redirect(&headers, FORGOT_PASSWORD_PATH);
    };

    let api = SellerApi::new(&state.api, &manager);
    let notice = match api.forgot_password(&email).await {
        Ok(_) => Notice::success("OTP resent to your email"),
        Err(e) => {
            tracing::warn!(error = %e, "OTP resend failed");
            Notice::error(e.user_message("Failed to resend OTP"))
        }
    };
    notify(manager.store(), notice).await;
    redirect(&headers, ENTER_OTP_PATH)
}

async fn reset_credentials(manager: &SessionManager<Session>) -> Option<(String, String)> {
    let email = reset_email(manager).await?;
    let otp = manager.reset_otp().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to read reset OTP");
        None
    })?;
    Some((email, otp))
}

pub async fn reset_password_page(session: Session, headers: HeaderMap) -> Response {
    let manager = SessionManager::new(session);
    let Some((email, _)) = reset_credentials(&manager).await else {
        return redirect(&headers, FORGOT_PASSWORD_PATH);
    };

    ResetPasswordTemplate {
        notices: take_notices(manager.store()).await,
        email,
    }
    .into_response()
}

pub async fn reset_password_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let manager = SessionManager::new(session);
    let Some((email, otp)) = reset_credentials(&manager).await else {
        return redirect(&headers, FORGOT_PASSWORD_PATH);
    };

    let invalid = match form.validate() {
        Err(errors) => Some(first_message(&errors)),
        Ok(()) => check_new_password(&form.password, &form.confirm_password)
            .err()
            .map(str::to_string),
    };
    if let Some(message) = invalid {
        notify(manager.store(), Notice::error(message)).await;
        return redirect(&headers, RESET_PASSWORD_PATH);
    }

    let api = SellerApi::new(&state.api, &manager);
    match api
        .reset_password(&email, &otp, &form.password, &form.confirm_password)
        .await
    {
        Ok(_) => {
            if let Err(e) = manager.clear_reset_flow().await {
                tracing::error!(error = %e, "Failed to clear reset flow");
            }
            notify(
                manager.store(),
                Notice::success("Password reset successful. Please login with your new password."),
            )
            .await;
            login_redirect(&headers)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Password reset failed");
            let message = e.user_message("Failed to reset password. Please try again.");
            notify(manager.store(), Notice::error(message)).await;
            redirect(&headers, RESET_PASSWORD_PATH)
        }
    }
}
