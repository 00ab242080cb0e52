//! List/detail orchestrator for loan slips
//!
//! Holds the current page of records and is the only writer to it. Loads
//! are last-request-wins: each load takes a ticket when issued and a
//! response is applied only if no later load has been issued since.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

use crate::{
    error::{ApiError, AppError, AppResult},
    models::{loan_slip::DEFAULT_LIMIT, total_pages, LoanSlip, LoanSlipQuery, Role, UpdateLoanSlip, UpdateScope},
    schemas::{CreateLoanSlipForm, UpdateLoanSlipForm},
    services::LoanSlipApi,
    state::query::{QueryController, QueryPatch},
};

#[derive(Debug, Default)]
struct BoardState {
    items: Vec<LoanSlip>,
    total: u64,
    /// Query of the response currently held
    applied: Option<LoanSlipQuery>,
    /// Query of the most recently issued load
    latest: Option<LoanSlipQuery>,
    generation: u64,
    last_error: Option<ApiError>,
}

/// Read-only view for presentation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub items: Vec<LoanSlip>,
    pub total: u64,
    pub query: Option<LoanSlipQuery>,
    pub loading: bool,
    pub last_error: Option<ApiError>,
}

impl BoardSnapshot {
    pub fn total_pages(&self) -> u32 {
        let limit = self.query.as_ref().map(|q| q.limit).unwrap_or(DEFAULT_LIMIT);
        total_pages(self.total, limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A later load was issued before this one resolved; its result was dropped
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    pub created: LoanSlip,
    /// Whether page 1 was reloaded afterwards
    pub refreshed: bool,
}

/// Restrict an update to the fields the caller's role may change
pub fn shape_update(form: UpdateLoanSlipForm, scope: UpdateScope) -> UpdateLoanSlip {
    let restricted = UpdateLoanSlip {
        status: form.status,
        borrowed_date: Some(form.borrowed_date),
        returned_date: Some(form.returned_date),
        existing_images: form.existing_images,
        new_images: form.new_images,
        ..UpdateLoanSlip::default()
    };

    match scope {
        UpdateScope::Restricted => restricted,
        UpdateScope::Full => UpdateLoanSlip {
            name: form.name,
            borrower_name: form.borrower_name,
            department: form.department,
            position: form.position,
            description: form.description,
            serial_number: form.serial_number,
            ..restricted
        },
    }
}

/// Marks a load ticket settled however the load ends, including when the
/// future is dropped mid-flight
struct Settle<'a> {
    settled: &'a AtomicU64,
    ticket: u64,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        self.settled.fetch_max(self.ticket, Ordering::AcqRel);
    }
}

pub struct LoanSlipBoard {
    api: Arc<dyn LoanSlipApi>,
    state: RwLock<BoardState>,
    /// Highest load ticket that has finished or been abandoned
    settled: AtomicU64,
    /// Committed query of the controller this board follows, if any
    query: Option<Arc<watch::Sender<LoanSlipQuery>>>,
}

impl LoanSlipBoard {
    pub fn new(api: Arc<dyn LoanSlipApi>) -> Self {
        Self {
            api,
            state: RwLock::new(BoardState::default()),
            settled: AtomicU64::new(0),
            query: None,
        }
    }

    /// Board that commits its own query changes (the page reset after a
    /// create) through `controller`
    pub fn linked(api: Arc<dyn LoanSlipApi>, controller: &QueryController) -> Self {
        Self {
            query: Some(controller.sender()),
            ..Self::new(api)
        }
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        let state = self.state.read().await;
        BoardSnapshot {
            items: state.items.clone(),
            total: state.total,
            query: state.applied.clone(),
            loading: self.settled.load(Ordering::Acquire) < state.generation,
            last_error: state.last_error.clone(),
        }
    }

    /// Fetch one page for `query`
    ///
    /// A failure keeps the records already held and is returned to the
    /// caller. A superseded response, success or failure, is dropped.
    pub async fn load(&self, query: LoanSlipQuery) -> AppResult<LoadOutcome> {
        let ticket = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.latest = Some(query.clone());
            state.generation
        };
        let _settle = Settle {
            settled: &self.settled,
            ticket,
        };

        let result = self.api.list(&query).await;

        let mut state = self.state.write().await;
        if state.generation != ticket {
            tracing::debug!(
                "Dropping stale loan slip page (ticket {}, latest {})",
                ticket,
                state.generation
            );
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                tracing::debug!("Loaded {} of {} loan slips", page.items.len(), page.total);
                state.items = page.items;
                state.total = page.total;
                state.applied = Some(query);
                state.last_error = None;
                Ok(LoadOutcome::Applied)
            }
            Err(err) => {
                tracing::warn!("Failed to load loan slips: {}", err);
                state.last_error = Some(err.clone());
                Err(err.into())
            }
        }
    }

    /// Load the most recently issued query again
    pub async fn reload(&self) -> AppResult<LoadOutcome> {
        let query = self.state.read().await.latest.clone().unwrap_or_default();
        self.load(query).await
    }

    /// Validate, create, then reload page 1 of the current query
    ///
    /// A linked controller is moved to page 1 as well, so the pager and the
    /// records held agree.
    pub async fn create(&self, form: CreateLoanSlipForm) -> AppResult<CreateOutcome> {
        form.validate_form()?;

        let created = self.api.create(form.into()).await?;
        tracing::info!("Created loan slip {} ({})", created.id, created.name);

        let linked = self.query.as_ref().map(|tx| tx.borrow().clone());
        let current = match linked {
            Some(query) => query,
            None => self.state.read().await.latest.clone().unwrap_or_default(),
        };
        let refreshed = match self.load(current.first_page()).await {
            Ok(outcome) => outcome == LoadOutcome::Applied,
            Err(err) => {
                tracing::warn!("List refresh after create failed: {}", err);
                false
            }
        };

        // The load above already covers page 1; `spawn_sync` skips it
        if let Some(tx) = &self.query {
            tx.send_if_modified(|q| QueryPatch::new().page(1).apply(q));
        }

        Ok(CreateOutcome { created, refreshed })
    }

    /// Update a held, editable record with the fields `role` may change
    ///
    /// The held record is replaced by the backend's representation.
    pub async fn update(&self, id: i64, form: UpdateLoanSlipForm, role: &Role) -> AppResult<LoanSlip> {
        let scope = role
            .update_scope()
            .ok_or_else(|| AppError::Forbidden(format!("role '{}' cannot update loan slips", role)))?;

        let held = self.held(id).await?;
        if !held.is_editable() {
            return Err(AppError::NotEditable {
                id,
                status: held.status,
            });
        }

        form.validate_form()?;

        let payload = shape_update(form, scope);
        tracing::debug!("Updating loan slip {} with fields {:?}", id, payload.field_names());
        let updated = self.api.update(id, payload).await?;

        let mut state = self.state.write().await;
        if let Some(slot) = state.items.iter_mut().find(|slip| slip.id == id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    /// Delete a held record still on loan; nothing is removed until the
    /// backend confirms
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let held = self.held(id).await?;
        if !held.is_deletable() {
            return Err(AppError::NotDeletable {
                id,
                status: held.status,
            });
        }

        self.api.delete(id).await?;
        tracing::info!("Deleted loan slip {}", id);

        let mut state = self.state.write().await;
        let before = state.items.len();
        state.items.retain(|slip| slip.id != id);
        if state.items.len() < before {
            state.total = state.total.saturating_sub(1);
        }
        Ok(())
    }

    /// Detail view fetch; `None` when the record does not exist
    pub async fn fetch_one(&self, id: i64) -> AppResult<Option<LoanSlip>> {
        Ok(self.api.get(id).await?)
    }

    async fn held(&self, id: i64) -> AppResult<LoanSlip> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|slip| slip.id == id)
            .cloned()
            .ok_or(AppError::NotLoaded(id))
    }

    async fn is_latest(&self, query: &LoanSlipQuery) -> bool {
        self.state.read().await.latest.as_ref() == Some(query)
    }

    /// Reload whenever the committed query changes
    ///
    /// Each change issues its own load so a slow response never blocks a
    /// newer one. A query the board has already issued last is not loaded
    /// twice. The task ends when the query sender is dropped.
    pub fn spawn_sync(board: Arc<Self>, mut queries: watch::Receiver<LoanSlipQuery>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let query = queries.borrow_and_update().clone();
                if !board.is_latest(&query).await {
                    let board = Arc::clone(&board);
                    tokio::spawn(async move {
                        if let Err(e) = board.load(query).await {
                            tracing::warn!("Background loan slip load failed: {}", e);
                        }
                    });
                }

                if queries.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
