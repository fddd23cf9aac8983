// Result cache and the transitions that are allowed to touch it
use tenderscout_api::{Pagination, Tender, TenderPage};
use tracing::{debug, info, warn};

use crate::query::Query;
use crate::{Error, Result};

pub const LISTING_FALLBACK: &str = "Failed to fetch tenders";
pub const DETAIL_FALLBACK: &str = "Failed to fetch tender";
pub const CATEGORIES_FALLBACK: &str = "Failed to fetch categories";
pub const COUNTRIES_FALLBACK: &str = "Failed to fetch countries";

/// The independent kinds of remote read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    Listing,
    Detail,
    Categories,
    Countries,
    Recommendations,
}

/// Proof that a read was issued, and in which order
///
/// Only the most recently issued ticket of each kind may write its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: ReadKind,
    seq: u64,
}

/// Outcome of a read that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// The result was merged into the cache
    Current(T),
    /// A newer read of the same kind was issued first; nothing was touched
    Superseded,
}

impl<T> Fetched<T> {
    pub fn current(self) -> Option<T> {
        match self {
            Fetched::Current(value) => Some(value),
            Fetched::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Fetched::Superseded)
    }
}

/// Why the recommendation feed came back empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    MissingCredential,
    Unavailable(String),
}

/// Recommendations never fail outward: they are either there or degraded
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendations {
    Ready(Vec<Tender>),
    Degraded(DegradeReason),
}

impl Recommendations {
    pub fn tenders(&self) -> &[Tender] {
        match self {
            Recommendations::Ready(tenders) => tenders,
            Recommendations::Degraded(_) => &[],
        }
    }
}

/// Loading flag and last error for one blocking read kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStatus {
    pub loading: bool,
    pub error: Option<String>,
}

/// Reference vocabularies are background data: errors only, no loading flag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceStatus {
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Sequences {
    listing: u64,
    detail: u64,
    categories: u64,
    countries: u64,
    recommendations: u64,
}

impl Sequences {
    fn slot(&mut self, kind: ReadKind) -> &mut u64 {
        match kind {
            ReadKind::Listing => &mut self.listing,
            ReadKind::Detail => &mut self.detail,
            ReadKind::Categories => &mut self.categories,
            ReadKind::Countries => &mut self.countries,
            ReadKind::Recommendations => &mut self.recommendations,
        }
    }

    fn issue(&mut self, kind: ReadKind) -> Ticket {
        let slot = self.slot(kind);
        *slot += 1;
        Ticket { kind, seq: *slot }
    }

    fn is_latest(&mut self, ticket: Ticket) -> bool {
        *self.slot(ticket.kind) == ticket.seq
    }
}

/// Everything the browser knows: the current query and the last good reads
///
/// Fields are read through accessors; the only way to change them is the
/// transitions below, which `Catalog` drives one at a time.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    query: Query,
    pagination: Pagination,
    listing: Vec<Tender>,
    selected: Option<Tender>,
    categories: Vec<String>,
    countries: Vec<String>,
    recommendations: Vec<Tender>,
    listing_status: ReadStatus,
    detail_status: ReadStatus,
    reference_status: ReferenceStatus,
    recommendations_loading: bool,
    sequences: Sequences,
}

impl CatalogState {
    pub fn with_query(query: Query) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn listing(&self) -> &[Tender] {
        &self.listing
    }

    pub fn selected(&self) -> Option<&Tender> {
        self.selected.as_ref()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn recommendations(&self) -> &[Tender] {
        &self.recommendations
    }

    pub fn listing_status(&self) -> &ReadStatus {
        &self.listing_status
    }

    pub fn detail_status(&self) -> &ReadStatus {
        &self.detail_status
    }

    pub fn reference_status(&self) -> &ReferenceStatus {
        &self.reference_status
    }

    pub fn recommendations_loading(&self) -> bool {
        self.recommendations_loading
    }

    /// First error worth showing, listing before detail before vocabularies
    pub fn error(&self) -> Option<&str> {
        self.listing_status
            .error
            .as_deref()
            .or(self.detail_status.error.as_deref())
            .or(self.reference_status.error.as_deref())
    }

    pub(crate) fn set_query(&mut self, query: Query) {
        self.query = query;
    }

    pub(crate) fn clear_selected(&mut self) {
        self.selected = None;
    }

    pub(crate) fn clear_errors(&mut self) {
        self.listing_status.error = None;
        self.detail_status.error = None;
        self.reference_status.error = None;
    }

    /// Issue a ticket for a new read and flag it as in flight
    pub(crate) fn begin(&mut self, kind: ReadKind) -> Ticket {
        let ticket = self.sequences.issue(kind);
        match kind {
            ReadKind::Listing => {
                self.listing_status = ReadStatus {
                    loading: true,
                    error: None,
                }
            }
            ReadKind::Detail => {
                self.detail_status = ReadStatus {
                    loading: true,
                    error: None,
                }
            }
            ReadKind::Recommendations => self.recommendations_loading = true,
            ReadKind::Categories | ReadKind::Countries => {}
        }
        debug!("Issued {:?} read #{}", kind, ticket.seq);
        ticket
    }

    fn is_stale(&mut self, ticket: Ticket) -> bool {
        if self.sequences.is_latest(ticket) {
            false
        } else {
            debug!("Discarding stale {:?} response #{}", ticket.kind, ticket.seq);
            true
        }
    }

    pub(crate) fn complete_listing(
        &mut self,
        ticket: Ticket,
        result: Result<TenderPage>,
    ) -> Result<Fetched<TenderPage>> {
        debug_assert_eq!(ticket.kind, ReadKind::Listing);
        if self.is_stale(ticket) {
            return Ok(Fetched::Superseded);
        }

        self.listing_status.loading = false;
        match result {
            Ok(page) => {
                info!(
                    "Loaded {} tenders (page {}/{}, {} total)",
                    page.tenders.len(),
                    page.pagination.page,
                    page.pagination.pages,
                    page.pagination.total
                );
                self.listing = page.tenders.clone();
                self.pagination = page.pagination;
                Ok(Fetched::Current(page))
            }
            Err(err) => {
                warn!("Listing fetch failed: {}", err);
                self.listing_status.error = Some(err.user_message(LISTING_FALLBACK));
                Err(err)
            }
        }
    }

    pub(crate) fn complete_detail(
        &mut self,
        ticket: Ticket,
        result: Result<Tender>,
    ) -> Result<Fetched<Tender>> {
        debug_assert_eq!(ticket.kind, ReadKind::Detail);
        if self.is_stale(ticket) {
            return Ok(Fetched::Superseded);
        }

        self.detail_status.loading = false;
        match result {
            Ok(tender) => {
                self.selected = Some(tender.clone());
                Ok(Fetched::Current(tender))
            }
            Err(err) => {
                warn!("Detail fetch failed: {}", err);
                self.detail_status.error = Some(err.user_message(DETAIL_FALLBACK));
                Err(err)
            }
        }
    }

    /// Shared by both vocabularies; a failure keeps whatever list was cached
    pub(crate) fn complete_vocabulary(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<String>>,
    ) -> Result<Fetched<Vec<String>>> {
        debug_assert!(matches!(
            ticket.kind,
            ReadKind::Categories | ReadKind::Countries
        ));
        if self.is_stale(ticket) {
            return Ok(Fetched::Superseded);
        }

        match result {
            Ok(values) => {
                if ticket.kind == ReadKind::Categories {
                    self.categories = values.clone();
                } else {
                    self.countries = values.clone();
                }
                Ok(Fetched::Current(values))
            }
            Err(err) => {
                let fallback = if ticket.kind == ReadKind::Categories {
                    CATEGORIES_FALLBACK
                } else {
                    COUNTRIES_FALLBACK
                };
                warn!("{:?} fetch failed: {}", ticket.kind, err);
                self.reference_status.error = Some(err.user_message(fallback));
                Err(err)
            }
        }
    }

    /// Any failure empties the feed and leaves every error field alone
    pub(crate) fn complete_recommendations(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Tender>>,
    ) -> Fetched<Recommendations> {
        debug_assert_eq!(ticket.kind, ReadKind::Recommendations);
        if self.is_stale(ticket) {
            return Fetched::Superseded;
        }

        self.recommendations_loading = false;
        match result {
            Ok(tenders) => {
                self.recommendations = tenders.clone();
                Fetched::Current(Recommendations::Ready(tenders))
            }
            Err(err) => {
                debug!("Recommendations unavailable: {}", err);
                self.recommendations.clear();
                let reason = match err {
                    Error::MissingCredential => DegradeReason::MissingCredential,
                    other => DegradeReason::Unavailable(other.to_string()),
                };
                Fetched::Current(Recommendations::Degraded(reason))
            }
        }
    }
}
