pub mod api_client;
pub mod backend;
pub mod countries;
pub mod error;
pub mod request;
pub mod retry;

pub use api_client::ApiClient;
pub use backend::SellerApi;
pub use countries::CountriesCache;
pub use error::ApiError;
pub use request::{ApiRequest, Attempt, FilePart, MultipartBody, RequestBody};
pub use retry::{decide, RetryDecision};
