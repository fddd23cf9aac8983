// HTTP client for the tender service
pub mod client;
pub mod models;
pub mod params;
pub mod retry;

// Re-export common types
pub use client::{ApiError, TenderClient, DEFAULT_API_BASE};
pub use models::{Budget, HealthStatus, Pagination, Tender, TenderPage, TenderStatus};
pub use params::ListParams;
pub use retry::RetryConfig;
