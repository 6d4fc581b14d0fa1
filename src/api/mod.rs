pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod retry;
pub mod secure_storage;
pub mod tables;

pub use auth::{AuthApi, SignUpOutcome};
pub use client::{ApiRequest, ApiResponse, BackendClient, Method, Transport};
pub use error::ApiError;
pub use http::HttpTransport;
pub use retry::{Backoff, RetryPolicy};
pub use secure_storage::SecureStorage;
pub use tables::TablesApi;
