//! Query/filter controller
//!
//! Single owner of the list query. Holds state only; the board subscribes
//! to the watch channel and fetches.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{total_pages, LoanSlipQuery, LoanStatus, SortField, SortOrder};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

/// Partial query update
///
/// The outer `Option` says whether the key is present in the patch; the
/// inner one is the value, `None` meaning "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPatch {
    search: Option<Option<String>>,
    status: Option<Option<LoanStatus>>,
    department: Option<Option<String>>,
    borrowed_from: Option<Option<NaiveDate>>,
    borrowed_to: Option<Option<NaiveDate>>,
    returned_from: Option<Option<NaiveDate>>,
    returned_to: Option<Option<NaiveDate>>,
    page: Option<u32>,
    limit: Option<u32>,
    sort: Option<Option<SortField>>,
    order: Option<Option<SortOrder>>,
}

impl QueryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty text clears the search
    pub fn search(mut self, value: Option<String>) -> Self {
        self.search = Some(value.filter(|s| !s.is_empty()));
        self
    }

    pub fn status(mut self, value: Option<LoanStatus>) -> Self {
        self.status = Some(value);
        self
    }

    pub fn department(mut self, value: Option<String>) -> Self {
        self.department = Some(value.filter(|s| !s.is_empty()));
        self
    }

    pub fn borrowed_from(mut self, value: Option<NaiveDate>) -> Self {
        self.borrowed_from = Some(value);
        self
    }

    pub fn borrowed_to(mut self, value: Option<NaiveDate>) -> Self {
        self.borrowed_to = Some(value);
        self
    }

    pub fn returned_from(mut self, value: Option<NaiveDate>) -> Self {
        self.returned_from = Some(value);
        self
    }

    pub fn returned_to(mut self, value: Option<NaiveDate>) -> Self {
        self.returned_to = Some(value);
        self
    }

    pub fn page(mut self, value: u32) -> Self {
        self.page = Some(value);
        self
    }

    pub fn limit(mut self, value: u32) -> Self {
        self.limit = Some(value);
        self
    }

    pub fn sort(mut self, value: Option<SortField>) -> Self {
        self.sort = Some(value);
        self
    }

    pub fn order(mut self, value: Option<SortOrder>) -> Self {
        self.order = Some(value);
        self
    }

    /// True when the patch carries any key other than `page`
    pub fn resets_page(&self) -> bool {
        self.search.is_some()
            || self.status.is_some()
            || self.department.is_some()
            || self.borrowed_from.is_some()
            || self.borrowed_to.is_some()
            || self.returned_from.is_some()
            || self.returned_to.is_some()
            || self.limit.is_some()
            || self.sort.is_some()
            || self.order.is_some()
    }

    /// Merge into `query`; returns whether anything changed
    pub fn apply(&self, query: &mut LoanSlipQuery) -> bool {
        let before = query.clone();

        if let Some(v) = &self.search {
            query.search = v.clone();
        }
        if let Some(v) = self.status {
            query.status = v;
        }
        if let Some(v) = &self.department {
            query.department = v.clone();
        }
        if let Some(v) = self.borrowed_from {
            query.borrowed_from = v;
        }
        if let Some(v) = self.borrowed_to {
            query.borrowed_to = v;
        }
        if let Some(v) = self.returned_from {
            query.returned_from = v;
        }
        if let Some(v) = self.returned_to {
            query.returned_to = v;
        }
        if let Some(v) = self.limit {
            query.limit = v.max(1);
        }
        if let Some(v) = self.sort {
            query.sort = v;
        }
        if let Some(v) = self.order {
            query.order = v;
        }

        if self.resets_page() {
            query.page = 1;
        } else if let Some(page) = self.page {
            query.page = page.max(1);
        }

        *query != before
    }
}

pub struct QueryController {
    query: Arc<watch::Sender<LoanSlipQuery>>,
    /// What the search box shows, ahead of the committed query
    search_input: String,
    pending_search: Option<JoinHandle<()>>,
    debounce: Duration,
}

impl QueryController {
    pub fn new(initial: LoanSlipQuery) -> Self {
        Self::with_debounce(initial, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(initial: LoanSlipQuery, debounce: Duration) -> Self {
        let search_input = initial.search.clone().unwrap_or_default();
        let (tx, _rx) = watch::channel(initial);
        Self {
            query: Arc::new(tx),
            search_input,
            pending_search: None,
            debounce,
        }
    }

    /// The committed query
    pub fn current(&self) -> LoanSlipQuery {
        self.query.borrow().clone()
    }

    /// Receiver notified on every committed change
    pub fn subscribe(&self) -> watch::Receiver<LoanSlipQuery> {
        self.query.subscribe()
    }

    pub(crate) fn sender(&self) -> Arc<watch::Sender<LoanSlipQuery>> {
        Arc::clone(&self.query)
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn patch(&self, patch: QueryPatch) -> bool {
        let changed = self.query.send_if_modified(|query| patch.apply(query));
        if changed {
            tracing::debug!("Query changed: {:?}", *self.query.borrow());
        }
        changed
    }

    /// Clear every filter; keeps limit, search and sort
    pub fn reset(&self) -> bool {
        self.query.send_if_modified(|query| {
            let cleared = query.cleared_filters();
            if *query == cleared {
                return false;
            }
            *query = cleared;
            true
        })
    }

    /// Update the search box now and commit the text once typing pauses
    ///
    /// Each call cancels the previous pending commit.
    pub fn set_search_text(&mut self, raw: impl Into<String>) {
        self.search_input = raw.into();
        self.cancel_pending_search();

        let query = Arc::clone(&self.query);
        let patch = QueryPatch::new().search(Some(self.search_input.clone()));
        let delay = self.debounce;
        self.pending_search = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            query.send_if_modified(|q| patch.apply(q));
        }));
    }

    pub fn cancel_pending_search(&mut self) {
        if let Some(handle) = self.pending_search.take() {
            handle.abort();
        }
    }

    /// Select a sort column; a fresh sort starts ascending and clearing
    /// the sort clears the order
    pub fn set_sort(&self, field: Option<SortField>) -> bool {
        let order = match field {
            Some(_) => Some(self.query.borrow().order.unwrap_or_default()),
            None => None,
        };
        self.patch(QueryPatch::new().sort(field).order(order))
    }

    pub fn toggle_order(&self) -> bool {
        let order = self.query.borrow().order.unwrap_or_default().toggled();
        self.patch(QueryPatch::new().order(Some(order)))
    }

    /// Move the pager, bounded by the pages `total` records fill
    pub fn go_to_page(&self, page: u32, total: u64) -> bool {
        let last = total_pages(total, self.query.borrow().limit);
        self.patch(QueryPatch::new().page(page.clamp(1, last)))
    }
}

impl Drop for QueryController {
    fn drop(&mut self) {
        self.cancel_pending_search();
    }
}
