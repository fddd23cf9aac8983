// HTTP provider - bridges the API client with the TenderService trait
use async_trait::async_trait;
use tenderscout_api::{ListParams, RetryConfig, Tender, TenderClient, TenderPage};

use crate::{config::ApiConfig, service::TenderService, Result};

/// Wrapper around TenderClient that implements TenderService
pub struct HttpTenderService {
    client: TenderClient,
}

impl HttpTenderService {
    pub fn new(client: TenderClient) -> Self {
        Self { client }
    }

    /// Build a client for `api.base_url` with the given retry policy
    pub fn from_config(api: &ApiConfig, retry: RetryConfig) -> Result<Self> {
        let client = TenderClient::with_base_url(api.base_url.clone())?.with_retry_config(retry);
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &TenderClient {
        &self.client
    }
}

#[async_trait]
impl TenderService for HttpTenderService {
    async fn list_tenders(&self, params: &ListParams) -> Result<TenderPage> {
        Ok(self.client.list_tenders(params).await?)
    }

    async fn get_tender(&self, id: &str) -> Result<Tender> {
        Ok(self.client.get_tender(id).await?)
    }

    async fn categories(&self) -> Result<Vec<String>> {
        Ok(self.client.categories().await?)
    }

    async fn countries(&self) -> Result<Vec<String>> {
        Ok(self.client.countries().await?)
    }

    async fn recommendations(&self, token: &str) -> Result<Vec<Tender>> {
        Ok(self.client.recommendations(token).await?)
    }
}
