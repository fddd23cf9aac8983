// Filter and pagination intent. These only move the query; fetching is the
// observer's job (see `Catalog::follow_query`).
use std::num::NonZeroU32;

use tracing::debug;

use crate::catalog::Catalog;
use crate::query::{FilterPatch, Query};

impl Catalog {
    /// Merge a partial filter update and go back to page 1
    pub async fn set_filters(&self, patch: FilterPatch) -> Query {
        self.update_query(|q| q.with_filters(&patch)).await
    }

    /// Drop all filters and go back to page 1; page size is kept
    pub async fn clear_filters(&self) -> Query {
        self.update_query(Query::cleared).await
    }

    /// Jump to `page` as given, even past the last known page
    pub async fn set_page(&self, page: u32) -> Query {
        self.update_query(|q| q.with_page(page)).await
    }

    pub async fn set_limit(&self, limit: NonZeroU32) -> Query {
        self.update_query(|q| q.with_limit(limit)).await
    }

    pub async fn clear_selected(&self) {
        self.state.lock().await.clear_selected();
    }

    /// Forget the last error of every read kind
    pub async fn clear_error(&self) {
        self.state.lock().await.clear_errors();
    }

    async fn update_query<F>(&self, transition: F) -> Query
    where
        F: FnOnce(&Query) -> Query,
    {
        let mut state = self.state.lock().await;
        let next = transition(state.query());
        state.set_query(next.clone());

        // Still under the lock, so observers see changes in the order they were made
        self.query_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                debug!("Query changed: {:?}", next);
                *current = next.clone();
                true
            }
        });

        next
    }
}
