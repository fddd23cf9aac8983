// Fetch orchestration: issues the reads and folds their outcomes into the cache
use std::sync::Arc;

use tenderscout_api::{Tender, TenderPage};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::query::Query;
use crate::service::TenderService;
use crate::state::{CatalogState, Fetched, ReadKind, Recommendations};
use crate::{Error, Result};

/// The tender browser core: query state, result cache and the reads that fill it
///
/// Every transition takes the state lock briefly and releases it before any
/// network await, so reads of any kind can overlap freely while the cache
/// is only ever seen between whole transitions. Share it behind an `Arc`.
pub struct Catalog {
    service: Arc<dyn TenderService>,
    pub(crate) state: Mutex<CatalogState>,
    pub(crate) query_tx: watch::Sender<Query>,
}

impl Catalog {
    pub fn new(service: Arc<dyn TenderService>) -> Self {
        Self::with_query(service, Query::default())
    }

    /// Start from a non-default query, e.g. a page size from config
    pub fn with_query(service: Arc<dyn TenderService>, query: Query) -> Self {
        let (query_tx, _) = watch::channel(query.clone());
        Self {
            service,
            state: Mutex::new(CatalogState::with_query(query)),
            query_tx,
        }
    }

    /// Copy of the whole cache for rendering
    pub async fn snapshot(&self) -> CatalogState {
        self.state.lock().await.clone()
    }

    pub async fn query(&self) -> Query {
        self.state.lock().await.query().clone()
    }

    /// Receiver that sees every query change made through the controller
    pub fn subscribe_query(&self) -> watch::Receiver<Query> {
        self.query_tx.subscribe()
    }

    /// Fetch one listing page for `query`
    ///
    /// Returns `Superseded` when another listing fetch was issued after this
    /// one; the cache then keeps whatever the newer fetch produces.
    pub async fn fetch_listing(&self, query: &Query) -> Result<Fetched<TenderPage>> {
        let ticket = self.state.lock().await.begin(ReadKind::Listing);
        let params = query.to_params();
        debug!("Fetching listing: {}", params.to_query_string());

        let result = self.service.list_tenders(&params).await;
        self.state.lock().await.complete_listing(ticket, result)
    }

    /// Fetch the listing for whatever the query currently is
    pub async fn refresh_listing(&self) -> Result<Fetched<TenderPage>> {
        let query = self.query().await;
        self.fetch_listing(&query).await
    }

    /// Load one tender into `selected`; on failure the old one stays
    pub async fn fetch_detail(&self, id: &str) -> Result<Fetched<Tender>> {
        let ticket = self.state.lock().await.begin(ReadKind::Detail);
        debug!("Fetching tender {}", id);

        let result = self.service.get_tender(id).await;
        self.state.lock().await.complete_detail(ticket, result)
    }

    pub async fn fetch_categories(&self) -> Result<Fetched<Vec<String>>> {
        let ticket = self.state.lock().await.begin(ReadKind::Categories);
        let result = self.service.categories().await;
        self.state.lock().await.complete_vocabulary(ticket, result)
    }

    pub async fn fetch_countries(&self) -> Result<Fetched<Vec<String>>> {
        let ticket = self.state.lock().await.begin(ReadKind::Countries);
        let result = self.service.countries().await;
        self.state.lock().await.complete_vocabulary(ticket, result)
    }

    /// Load both vocabularies side by side
    pub async fn fetch_reference_data(
        &self,
    ) -> (Result<Fetched<Vec<String>>>, Result<Fetched<Vec<String>>>) {
        tokio::join!(self.fetch_categories(), self.fetch_countries())
    }

    /// Personalized feed for the holder of `token`
    ///
    /// There is no error path: without a token nothing is sent, and any
    /// failure empties the feed and comes back as `Degraded`.
    pub async fn fetch_recommendations(&self, token: Option<&str>) -> Fetched<Recommendations> {
        let ticket = self.state.lock().await.begin(ReadKind::Recommendations);

        let result = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => self.service.recommendations(token).await,
            None => {
                debug!("No credential token, skipping recommendations request");
                Err(Error::MissingCredential)
            }
        };

        self.state.lock().await.complete_recommendations(ticket, result)
    }

    /// Load the listing for the current query, then again on every change
    ///
    /// Runs until the returned future is dropped. Changes that pile up while
    /// a fetch is in flight collapse into one fetch of the latest query.
    pub async fn follow_query(&self) {
        let mut rx = self.subscribe_query();
        let mut query = rx.borrow_and_update().clone();
        info!("Following query changes");

        loop {
            if let Err(e) = self.fetch_listing(&query).await {
                warn!("Listing refresh failed: {}", e);
            }
            if rx.changed().await.is_err() {
                break;
            }
            query = rx.borrow_and_update().clone();
        }
    }
}
