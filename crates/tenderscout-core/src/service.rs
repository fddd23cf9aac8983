use tenderscout_api::{ListParams, Tender, TenderPage};

use crate::Result;

/// The remote reads the catalog depends on
///
/// The HTTP client implements this in production; tests swap in mocks or
/// fakes that control when each response arrives.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TenderService: Send + Sync {
    async fn list_tenders(&self, params: &ListParams) -> Result<TenderPage>;
    async fn get_tender(&self, id: &str) -> Result<Tender>;
    async fn categories(&self) -> Result<Vec<String>>;
    async fn countries(&self) -> Result<Vec<String>>;
    /// Requires a bearer token; implementations never see a blank one
    async fn recommendations(&self, token: &str) -> Result<Vec<Tender>>;
}
