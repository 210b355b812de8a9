pub mod auth;
pub mod billing;
pub mod catalog;
pub mod chat;
pub mod de;
pub mod order;
pub mod report;
pub mod shop;
pub mod user;

pub use auth::LoginResponse;
pub use billing::{BillingPeriod, CreatePaymentRequest, PaymentIntent, SubscriptionPlan};
pub use catalog::{Category, Product};
pub use chat::{Attachment, ChatMessage, ChatSummary, ChatThread, SendOptions};
pub use order::{Order, OrderStatus};
pub use report::{Overview, ReportPeriod, SalesPage};
pub use shop::Shop;
pub use user::{AuthUser, UserProfile};
