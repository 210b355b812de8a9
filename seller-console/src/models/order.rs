use super::catalog::Photo;
use super::de;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderProduct {
    pub title: String,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderItem {
    pub product: Option<OrderProduct>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-facing order number; also the key for status updates.
    pub order_id: String,
    pub customer: Option<Customer>,
    pub items: Vec<OrderItem>,
    #[serde(deserialize_with = "de::number")]
    pub total_amount: f64,
    pub created_at: Option<String>,
    /// Kept as text so an unknown status still renders.
    pub status: String,
    pub tracking_number: Option<String>,
}

impl Order {
    pub fn first_product(&self) -> Option<&OrderProduct> {
        self.items.first().and_then(|item| item.product.as_ref())
    }

    pub fn first_photo_url(&self) -> Option<&str> {
        self.first_product()
            .and_then(|p| p.photos.first())
            .map(|photo| photo.url.as_str())
            .filter(|url| !url.is_empty())
    }

    pub fn customer_initial(&self) -> String {
        self.customer
            .as_ref()
            .and_then(|c| c.name.chars().next())
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "U".to_string())
    }

    pub fn status_label(&self) -> String {
        self.status.replacen('_', " ", 1)
    }

    pub fn status_css(&self) -> &'static str {
        match self.status.parse::<OrderStatus>() {
            Ok(OrderStatus::Pending) => "badge badge-yellow",
            Ok(OrderStatus::InProgress) => "badge badge-blue",
            Ok(OrderStatus::Shipped) => "badge badge-purple",
            Ok(OrderStatus::Delivered) => "badge badge-green",
            Ok(OrderStatus::Cancelled) => "badge badge-red",
            Err(_) => "badge",
        }
    }

    pub fn placed_at(&self) -> String {
        self.created_at.as_deref().map(de::date_time).unwrap_or_default()
    }

    pub fn total_label(&self) -> String {
        de::money(self.total_amount)
    }
}
