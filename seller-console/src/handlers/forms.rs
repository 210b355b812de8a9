//! Form payloads and their validation rules.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

pub const FILL_ALL_FIELDS: &str = "Please fill in all fields";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
pub const MIN_PASSWORD_LEN: usize = 6;

/// First message carried by a failed validation, or the generic one.
pub fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| FILL_ALL_FIELDS.to_string())
}

/// Trim then require; blanks count as missing.
fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("required");
        err.message = Some(FILL_ALL_FIELDS.into());
        return Err(err);
    }
    Ok(())
}

/// Shared rule for choosing a new password.
pub fn check_new_password(password: &str, confirm: &str) -> Result<(), &'static str> {
    if password != confirm {
        return Err(PASSWORD_MISMATCH);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PASSWORD_TOO_SHORT);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordForm {
    #[validate(custom(function = "not_blank", message = "Please enter your email"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpForm {
    #[serde(default)]
    pub otp: String,
}

impl OtpForm {
    /// The code when it is exactly six digits.
    pub fn code(&self) -> Option<&str> {
        let otp = self.otp.trim();
        (otp.len() == 6 && otp.chars().all(|c| c.is_ascii_digit())).then_some(otp)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordForm {
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[validate(custom(function = "not_blank"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordForm {
    #[validate(custom(function = "not_blank"))]
    pub current_password: String,
    #[validate(custom(function = "not_blank"))]
    pub new_password: String,
    #[validate(custom(function = "not_blank"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusForm {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
    /// List filter and page to return to.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CallForm {
    #[serde(default)]
    pub call_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    #[validate(length(min = 1, message = "Please choose a plan"))]
    pub plan_id: String,
    #[serde(default)]
    pub billing_period: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmPaymentForm {
    #[serde(rename = "paymentIntentId", alias = "payment_intent_id")]
    #[validate(length(min = 1, message = "Missing payment intent"))]
    pub payment_intent_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Highest page a list will request; keeps `page + 1` in the pager in range.
pub const MAX_PAGE: u32 = 10_000;

/// 1-based page number from a query, clamped to `1..=MAX_PAGE`.
pub fn clamp_page(page: Option<u32>) -> u32 {
    page.unwrap_or(1).clamp(1, MAX_PAGE)
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        clamp_page(self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_login_fields_are_rejected() {
        let form = LoginForm {
            email: "  ".into(),
            password: "secret".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(first_message(&errors), FILL_ALL_FIELDS);
    }

    #[test]
    fn forgot_password_has_its_own_message() {
        let errors = ForgotPasswordForm { email: "".into() }.validate().unwrap_err();
        assert_eq!(first_message(&errors), "Please enter your email");
    }

    #[test]
    fn new_password_rules() {
        assert_eq!(check_new_password("abcdef", "abcdeg"), Err(PASSWORD_MISMATCH));
        assert_eq!(check_new_password("abc", "abc"), Err(PASSWORD_TOO_SHORT));
        assert_eq!(check_new_password("abcdef", "abcdef"), Ok(()));
    }

    #[test]
    fn otp_must_be_six_digits() {
        let code = |otp: &str| OtpForm { otp: otp.into() }.code().map(str::to_string);
        assert_eq!(code(" 123456 ").as_deref(), Some("123456"));
        assert_eq!(code("12345"), None);
        assert_eq!(code("12a456"), None);
    }

    #[test]
    fn page_defaults_to_one() {
        assert_eq!(PageQuery::default().page(), 1);
        assert_eq!(PageQuery { page: Some(0) }.page(), 1);
        assert_eq!(PageQuery { page: Some(3) }.page(), 3);
    }

    #[test]
    fn payment_payloads_need_identifiers() {
        let form = PaymentForm {
            plan_id: String::new(),
            billing_period: None,
        };
        assert_eq!(first_message(&form.validate().unwrap_err()), "Please choose a plan");

        let confirm = ConfirmPaymentForm {
            payment_intent_id: "pi_123".into(),
        };
        assert!(confirm.validate().is_ok());
    }

    #[test]
    fn huge_page_numbers_are_clamped() {
        let page = PageQuery {
            page: Some(u32::MAX),
        }
        .page();
        assert_eq!(page, MAX_PAGE);
        assert!(page.checked_add(1).is_some());
    }
}
