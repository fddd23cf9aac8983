// Core of the tender browser: query state, result cache and fetch orchestration
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod providers;
pub mod query;
pub mod service;
pub mod state;

pub use catalog::Catalog;
pub use config::Config;
pub use error::Error;
pub use providers::HttpTenderService;
pub use query::{FilterPatch, Query};
pub use service::TenderService;
pub use state::{
    CatalogState, DegradeReason, Fetched, ReadKind, ReadStatus, Recommendations, ReferenceStatus,
};

// Wire types callers need alongside the catalog
pub use tenderscout_api::{ListParams, Pagination, Tender, TenderPage, TenderStatus};

/// Result type alias for the core crate
pub type Result<T> = std::result::Result<T, Error>;
