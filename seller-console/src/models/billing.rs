use super::de;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionPlan {
    #[serde(rename = "_id")]
    pub id: String,
    pub plan_name: String,
    #[serde(deserialize_with = "de::number")]
    pub price_per_month: f64,
    #[serde(deserialize_with = "de::number")]
    pub price_per_year: f64,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub is_active: Option<bool>,
}

impl SubscriptionPlan {
    pub fn price_for(&self, period: BillingPeriod) -> f64 {
        match period {
            BillingPeriod::Monthly => self.price_per_month,
            BillingPeriod::Yearly => self.price_per_year,
        }
    }

    pub fn description_text(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description")
    }
}

/// Plans are listed unless explicitly marked inactive.
pub fn active_plans(plans: Vec<SubscriptionPlan>) -> Vec<SubscriptionPlan> {
    plans
        .into_iter()
        .filter(|plan| plan.is_active != Some(false))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Yearly,
}

impl FromStr for BillingPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingPeriod::Monthly),
            "yearly" => Ok(BillingPeriod::Yearly),
            other => Err(format!("unknown billing period: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Subscription,
    Order,
}

/// Body of `POST /payment/create-payment`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub user_id: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: PaymentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<BillingPeriod>,
}

impl CreatePaymentRequest {
    pub fn subscription(user_id: &str, plan: &SubscriptionPlan, period: BillingPeriod) -> Self {
        Self {
            user_id: user_id.to_string(),
            price: plan.price_for(period),
            subscription_id: Some(plan.id.clone()),
            order_id: None,
            kind: PaymentKind::Subscription,
            billing_period: Some(period),
        }
    }
}

/// Processor intent handed to the browser to collect card details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentIntent {
    pub client_secret: String,
    pub payment_intent_id: Option<String>,
}
