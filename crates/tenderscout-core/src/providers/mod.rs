// Provider implementations for the tender service
pub mod http;

pub use http::HttpTenderService;
