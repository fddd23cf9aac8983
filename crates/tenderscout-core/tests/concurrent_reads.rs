use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tenderscout_core::{
    Catalog, Error, Fetched, FilterPatch, ListParams, Pagination, Query, Recommendations, Result,
    Tender, TenderPage, TenderService,
};
use tokio::sync::{mpsc, oneshot, Mutex};

fn tender(id: &str) -> Tender {
    serde_json::from_value(serde_json::json!({ "_id": id, "title": id })).unwrap()
}

fn page(id: &str, number: u32) -> TenderPage {
    TenderPage {
        tenders: vec![tender(id)],
        pagination: Pagination {
            page: number,
            limit: 10,
            total: 30,
            pages: 3,
        },
    }
}

type Gates = HashMap<u32, oneshot::Sender<Result<TenderPage>>>;

/// Listing responses are held until the test releases them, keyed by page number
struct GatedService {
    gates: Mutex<HashMap<u32, oneshot::Receiver<Result<TenderPage>>>>,
    issued: mpsc::UnboundedSender<u32>,
}

impl GatedService {
    fn new(pages: &[u32]) -> (Arc<Self>, Gates, mpsc::UnboundedReceiver<u32>) {
        let mut gates = HashMap::new();
        let mut senders = HashMap::new();
        for &p in pages {
            let (tx, rx) = oneshot::channel();
            gates.insert(p, rx);
            senders.insert(p, tx);
        }
        let (issued, issued_rx) = mpsc::unbounded_channel();
        let service = Arc::new(Self {
            gates: Mutex::new(gates),
            issued,
        });
        (service, senders, issued_rx)
    }
}

#[async_trait]
impl TenderService for GatedService {
    async fn list_tenders(&self, params: &ListParams) -> Result<TenderPage> {
        let number = params.page.unwrap_or(1);
        let gate = self.gates.lock().await.remove(&number);
        let _ = self.issued.send(number);
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(Error::TransientNetworkFailure("gate dropped".into()))),
            None => Err(Error::TransientNetworkFailure(format!("no gate for page {}", number))),
        }
    }

    async fn get_tender(&self, id: &str) -> Result<Tender> {
        Ok(tender(id))
    }

    async fn categories(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn countries(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn recommendations(&self, _token: &str) -> Result<Vec<Tender>> {
        Ok(Vec::new())
    }
}

fn spawn_listing(
    catalog: &Arc<Catalog>,
    number: u32,
) -> tokio::task::JoinHandle<Result<Fetched<TenderPage>>> {
    let catalog = Arc::clone(catalog);
    tokio::spawn(async move { catalog.fetch_listing(&Query::default().with_page(number)).await })
}

#[tokio::test]
async fn test_older_response_arriving_last_is_discarded() {
    let (service, mut gates, mut issued) = GatedService::new(&[1, 2]);
    let catalog = Arc::new(Catalog::new(service));

    let a = spawn_listing(&catalog, 1);
    assert_eq!(issued.recv().await, Some(1));
    let b = spawn_listing(&catalog, 2);
    assert_eq!(issued.recv().await, Some(2));

    gates.remove(&2).unwrap().send(Ok(page("b", 2))).unwrap();
    let b_result = b.await.unwrap().unwrap();
    assert!(matches!(b_result, Fetched::Current(_)));

    gates.remove(&1).unwrap().send(Ok(page("a", 1))).unwrap();
    let a_result = a.await.unwrap().unwrap();
    assert!(a_result.is_superseded());

    let state = catalog.snapshot().await;
    assert_eq!(state.listing()[0].id, "b");
    assert_eq!(state.pagination().page, 2);
    assert!(!state.listing_status().loading);
}

#[tokio::test]
async fn test_older_response_arriving_first_does_not_clear_loading() {
    let (service, mut gates, mut issued) = GatedService::new(&[1, 2]);
    let catalog = Arc::new(Catalog::new(service));

    let a = spawn_listing(&catalog, 1);
    assert_eq!(issued.recv().await, Some(1));
    let b = spawn_listing(&catalog, 2);
    assert_eq!(issued.recv().await, Some(2));

    gates.remove(&1).unwrap().send(Ok(page("a", 1))).unwrap();
    assert!(a.await.unwrap().unwrap().is_superseded());

    let state = catalog.snapshot().await;
    assert!(state.listing().is_empty());
    assert!(state.listing_status().loading);

    gates.remove(&2).unwrap().send(Ok(page("b", 2))).unwrap();
    b.await.unwrap().unwrap();
    assert_eq!(catalog.snapshot().await.listing()[0].id, "b");
}

#[tokio::test]
async fn test_stale_failure_never_reaches_error() {
    let (service, mut gates, mut issued) = GatedService::new(&[1, 2]);
    let catalog = Arc::new(Catalog::new(service));

    let a = spawn_listing(&catalog, 1);
    assert_eq!(issued.recv().await, Some(1));
    let b = spawn_listing(&catalog, 2);
    assert_eq!(issued.recv().await, Some(2));

    gates.remove(&2).unwrap().send(Ok(page("b", 2))).unwrap();
    b.await.unwrap().unwrap();

    let rejection = Error::RemoteRejection {
        status: 500,
        message: Some("timeout talking to database".into()),
    };
    gates.remove(&1).unwrap().send(Err(rejection)).unwrap();
    assert!(matches!(a.await.unwrap(), Ok(Fetched::Superseded)));

    let state = catalog.snapshot().await;
    assert!(state.error().is_none());
    assert_eq!(state.listing()[0].id, "b");
}

#[tokio::test]
async fn test_detail_does_not_disturb_listing_in_flight() {
    let (service, mut gates, mut issued) = GatedService::new(&[1]);
    let catalog = Arc::new(Catalog::new(service));

    let listing = spawn_listing(&catalog, 1);
    assert_eq!(issued.recv().await, Some(1));

    catalog.fetch_detail("t-9").await.unwrap();
    let state = catalog.snapshot().await;
    assert!(state.listing_status().loading);
    assert!(!state.detail_status().loading);
    assert_eq!(state.selected().map(|t| t.id.as_str()), Some("t-9"));

    gates.remove(&1).unwrap().send(Ok(page("a", 1))).unwrap();
    listing.await.unwrap().unwrap();
    let state = catalog.snapshot().await;
    assert!(!state.listing_status().loading);
    assert_eq!(state.selected().map(|t| t.id.as_str()), Some("t-9"));
}

/// Answers every listing at once and remembers what was asked
#[derive(Default)]
struct RecordingService {
    requests: Mutex<Vec<ListParams>>,
}

#[async_trait]
impl TenderService for RecordingService {
    async fn list_tenders(&self, params: &ListParams) -> Result<TenderPage> {
        self.requests.lock().await.push(params.clone());
        Ok(page("p", params.page.unwrap_or(1)))
    }

    async fn get_tender(&self, id: &str) -> Result<Tender> {
        Ok(tender(id))
    }

    async fn categories(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn countries(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn recommendations(&self, _token: &str) -> Result<Vec<Tender>> {
        Ok(Vec::new())
    }
}

async fn wait_for_requests(service: &RecordingService, count: usize) -> Vec<ListParams> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let requests = service.requests.lock().await.clone();
            if requests.len() >= count {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listing was not re-fetched in time")
}

#[tokio::test]
async fn test_follower_refetches_on_query_change() {
    let service = Arc::new(RecordingService::default());
    let catalog = Arc::new(Catalog::new(service.clone()));

    let follower = {
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move { catalog.follow_query().await })
    };

    let initial = wait_for_requests(&service, 1).await;
    assert_eq!(initial[0].to_query_string(), "page=1&limit=10");

    catalog
        .set_filters(FilterPatch::new().search("health").country("Kenya"))
        .await;
    let requests = wait_for_requests(&service, 2).await;
    assert_eq!(
        requests.last().unwrap().to_query_string(),
        "page=1&limit=10&search=health&country=Kenya"
    );

    catalog.set_page(99).await;
    let requests = wait_for_requests(&service, 3).await;
    assert_eq!(requests.last().unwrap().page, Some(99));

    follower.abort();
}

type Held<T> = Mutex<HashMap<String, oneshot::Receiver<Result<T>>>>;

/// Detail and recommendation responses held per id or token
struct GatedLookups {
    details: Held<Tender>,
    picks: Held<Vec<Tender>>,
    issued: mpsc::UnboundedSender<String>,
}

impl GatedLookups {
    fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (issued, issued_rx) = mpsc::unbounded_channel();
        let service = Self {
            details: Mutex::new(HashMap::new()),
            picks: Mutex::new(HashMap::new()),
            issued,
        };
        (service, issued_rx)
    }

    async fn hold_detail(&self, id: &str) -> oneshot::Sender<Result<Tender>> {
        let (tx, rx) = oneshot::channel();
        self.details.lock().await.insert(id.to_string(), rx);
        tx
    }

    async fn hold_picks(&self, token: &str) -> oneshot::Sender<Result<Vec<Tender>>> {
        let (tx, rx) = oneshot::channel();
        self.picks.lock().await.insert(token.to_string(), rx);
        tx
    }
}

async fn released<T>(held: &Held<T>, key: &str, issued: &mpsc::UnboundedSender<String>) -> Result<T> {
    let gate = held.lock().await.remove(key);
    let _ = issued.send(key.to_string());
    match gate {
        Some(gate) => gate
            .await
            .unwrap_or_else(|_| Err(Error::TransientNetworkFailure("gate dropped".into()))),
        None => Err(Error::TransientNetworkFailure(format!("no gate for {}", key))),
    }
}

#[async_trait]
impl TenderService for GatedLookups {
    async fn list_tenders(&self, params: &ListParams) -> Result<TenderPage> {
        Ok(page("p", params.page.unwrap_or(1)))
    }

    async fn get_tender(&self, id: &str) -> Result<Tender> {
        released(&self.details, id, &self.issued).await
    }

    async fn categories(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn countries(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn recommendations(&self, token: &str) -> Result<Vec<Tender>> {
        released(&self.picks, token, &self.issued).await
    }
}

fn spawn_detail(
    catalog: &Arc<Catalog>,
    id: &'static str,
) -> tokio::task::JoinHandle<Result<Fetched<Tender>>> {
    let catalog = Arc::clone(catalog);
    tokio::spawn(async move { catalog.fetch_detail(id).await })
}

fn spawn_picks(
    catalog: &Arc<Catalog>,
    token: &'static str,
) -> tokio::task::JoinHandle<Fetched<Recommendations>> {
    let catalog = Arc::clone(catalog);
    tokio::spawn(async move { catalog.fetch_recommendations(Some(token)).await })
}

#[tokio::test]
async fn test_older_detail_arriving_last_keeps_newer_selection() {
    let (service, mut issued) = GatedLookups::new();
    let first = service.hold_detail("t-1").await;
    let second = service.hold_detail("t-2").await;
    let catalog = Arc::new(Catalog::new(Arc::new(service)));

    let a = spawn_detail(&catalog, "t-1");
    assert_eq!(issued.recv().await.as_deref(), Some("t-1"));
    let b = spawn_detail(&catalog, "t-2");
    assert_eq!(issued.recv().await.as_deref(), Some("t-2"));

    second.send(Ok(tender("t-2"))).unwrap();
    assert!(matches!(b.await.unwrap(), Ok(Fetched::Current(_))));

    first.send(Ok(tender("t-1"))).unwrap();
    assert!(a.await.unwrap().unwrap().is_superseded());

    let state = catalog.snapshot().await;
    assert_eq!(state.selected().map(|t| t.id.as_str()), Some("t-2"));
    assert!(!state.detail_status().loading);
}

#[tokio::test]
async fn test_stale_detail_failure_leaves_no_error() {
    let (service, mut issued) = GatedLookups::new();
    let first = service.hold_detail("bad-id").await;
    let second = service.hold_detail("t-2").await;
    let catalog = Arc::new(Catalog::new(Arc::new(service)));

    let a = spawn_detail(&catalog, "bad-id");
    assert_eq!(issued.recv().await.as_deref(), Some("bad-id"));
    let b = spawn_detail(&catalog, "t-2");
    assert_eq!(issued.recv().await.as_deref(), Some("t-2"));

    second.send(Ok(tender("t-2"))).unwrap();
    b.await.unwrap().unwrap();

    let rejection = Error::RemoteRejection {
        status: 404,
        message: Some("Tender not found".into()),
    };
    first.send(Err(rejection)).unwrap();
    assert!(matches!(a.await.unwrap(), Ok(Fetched::Superseded)));

    let state = catalog.snapshot().await;
    assert!(state.detail_status().error.is_none());
    assert_eq!(state.selected().map(|t| t.id.as_str()), Some("t-2"));
}

#[tokio::test]
async fn test_stale_recommendation_failure_keeps_newer_feed() {
    let (service, mut issued) = GatedLookups::new();
    let expired = service.hold_picks("expired-jwt").await;
    let fresh = service.hold_picks("fresh-jwt").await;
    let catalog = Arc::new(Catalog::new(Arc::new(service)));

    let a = spawn_picks(&catalog, "expired-jwt");
    assert_eq!(issued.recv().await.as_deref(), Some("expired-jwt"));
    let b = spawn_picks(&catalog, "fresh-jwt");
    assert_eq!(issued.recv().await.as_deref(), Some("fresh-jwt"));

    fresh.send(Ok(vec![tender("r-1"), tender("r-2")])).unwrap();
    let newer = b.await.unwrap();
    assert_eq!(newer.current().map(|r| r.tenders().len()), Some(2));

    let rejection = Error::RemoteRejection {
        status: 401,
        message: None,
    };
    expired.send(Err(rejection)).unwrap();
    assert!(a.await.unwrap().is_superseded());

    let state = catalog.snapshot().await;
    assert_eq!(state.recommendations().len(), 2);
    assert!(!state.recommendations_loading());
    assert!(state.error().is_none());
}
