use std::num::NonZeroU32;

use tenderscout_api::ListParams;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// What the user currently asked for: filters plus the page window
///
/// Empty filter strings mean "unconstrained". Values are never checked
/// against the category/country vocabularies; the server is the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub search: String,
    pub country: String,
    pub category: String,
    pub status: String,
    pub page: u32,
    pub limit: u32,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search: String::new(),
            country: String::new(),
            category: String::new(),
            status: String::new(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A partial filter update; `None` leaves the field as it is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub search: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, value: impl Into<String>) -> Self {
        self.search = Some(value.into());
        self
    }

    pub fn country(mut self, value: impl Into<String>) -> Self {
        self.country = Some(value.into());
        self
    }

    pub fn category(mut self, value: impl Into<String>) -> Self {
        self.category = Some(value.into());
        self
    }

    pub fn status(mut self, value: impl Into<String>) -> Self {
        self.status = Some(value.into());
        self
    }
}

impl Query {
    /// Merge `patch` into the filters and go back to page 1
    ///
    /// The page resets even when the patch is empty.
    pub fn with_filters(&self, patch: &FilterPatch) -> Query {
        let mut next = self.clone();
        if let Some(search) = &patch.search {
            next.search = search.clone();
        }
        if let Some(country) = &patch.country {
            next.country = country.clone();
        }
        if let Some(category) = &patch.category {
            next.category = category.clone();
        }
        if let Some(status) = &patch.status {
            next.status = status.clone();
        }
        next.page = 1;
        next
    }

    /// Drop every filter, keep the page size
    pub fn cleared(&self) -> Query {
        Query {
            limit: self.limit,
            ..Query::default()
        }
    }

    /// Jump to `page` as given; no clamping against the known page count
    pub fn with_page(&self, page: u32) -> Query {
        Query {
            page,
            ..self.clone()
        }
    }

    /// Change the page size, which moves the window back to page 1
    pub fn with_limit(&self, limit: NonZeroU32) -> Query {
        Query {
            limit: limit.get(),
            page: 1,
            ..self.clone()
        }
    }

    /// Wire parameters for the listing endpoint
    ///
    /// A zero page or limit is left off so the server applies its own default.
    pub fn to_params(&self) -> ListParams {
        ListParams {
            page: Some(self.page).filter(|&p| p > 0),
            limit: Some(self.limit).filter(|&l| l > 0),
            search: self.search.clone(),
            country: self.country.clone(),
            category: self.category.clone(),
            status: self.status.clone(),
        }
    }
}
