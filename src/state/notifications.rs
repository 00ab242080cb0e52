//! Notification feed, unread counter and relative timestamps

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

use crate::{
    error::{AppError, AppResult},
    models::{dates::format_display, Notification},
    services::NotificationApi,
};

pub const PAGE_SIZE: u32 = 10;
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct FeedState {
    items: Vec<Notification>,
    total: u64,
    /// Last page loaded, 0 before the first load
    page: u32,
    unread_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<Notification>,
    pub total: u64,
    pub page: u32,
    pub unread_count: u64,
    pub has_more: bool,
}

/// Paged notification feed with its unread counter
///
/// The counter and the feed are fetched independently and may briefly
/// disagree.
pub struct NotificationFeed {
    api: Arc<dyn NotificationApi>,
    page_size: u32,
    state: RwLock<FeedState>,
}

impl NotificationFeed {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        Self::with_page_size(api, PAGE_SIZE)
    }

    pub fn with_page_size(api: Arc<dyn NotificationApi>, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            state: RwLock::new(FeedState::default()),
        }
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.read().await;
        FeedSnapshot {
            items: state.items.clone(),
            total: state.total,
            page: state.page,
            unread_count: state.unread_count,
            has_more: (state.items.len() as u64) < state.total,
        }
    }

    pub async fn unread_count(&self) -> u64 {
        self.state.read().await.unread_count
    }

    pub async fn has_more(&self) -> bool {
        let state = self.state.read().await;
        (state.items.len() as u64) < state.total
    }

    /// Fetch the unread counter; called on focus and on demand
    pub async fn refresh_unread_count(&self) -> AppResult<u64> {
        let count = self.api.unread_count().await.map_err(|e| {
            tracing::warn!("Failed to refresh unread count: {}", e);
            e
        })?;
        self.state.write().await.unread_count = count;
        Ok(count)
    }

    /// Page 1 replaces the feed, later pages append to it
    pub async fn load_page(&self, page: u32) -> AppResult<()> {
        let page = page.max(1);
        let fetched = self.api.list(page, self.page_size).await?;
        tracing::debug!(
            "Loaded notification page {} ({} items, {} total)",
            page,
            fetched.items.len(),
            fetched.total
        );

        let mut state = self.state.write().await;
        if page == 1 {
            state.items = fetched.items;
        } else {
            for item in fetched.items {
                if !state.items.iter().any(|held| held.id == item.id) {
                    state.items.push(item);
                }
            }
        }
        state.total = fetched.total;
        state.page = page;
        Ok(())
    }

    /// Load the next page; `false` when everything is already loaded
    pub async fn load_more(&self) -> AppResult<bool> {
        let next = {
            let state = self.state.read().await;
            if state.page > 0 && (state.items.len() as u64) >= state.total {
                return Ok(false);
            }
            state.page + 1
        };
        self.load_page(next).await?;
        Ok(true)
    }

    /// Mark one held notification read
    ///
    /// The backend is asked first; local state changes only once it
    /// confirms. Returns `false` without a request when already read.
    pub async fn mark_read(&self, id: i64) -> AppResult<bool> {
        {
            let state = self.state.read().await;
            let held = state
                .items
                .iter()
                .find(|n| n.id == id)
                .ok_or(AppError::NotLoaded(id))?;
            if held.is_read {
                return Ok(false);
            }
        }

        self.api.mark_read(id).await?;

        let mut state = self.state.write().await;
        let flipped = state
            .items
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| n.mark_read(Utc::now()))
            .unwrap_or(false);
        if flipped {
            state.unread_count = state.unread_count.saturating_sub(1);
        }
        Ok(flipped)
    }
}

/// "N minutes ago" style label for `at`, relative to `now`
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);

    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }

    let days = elapsed.num_days();
    if days < 7 {
        return plural(days, "day");
    }

    format_display(at.date_naive())
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Periodic "now" reference for relative labels; never refetches data
pub struct RelativeClock {
    now: watch::Receiver<DateTime<Utc>>,
    task: JoinHandle<()>,
}

impl RelativeClock {
    pub fn start(tick: Duration) -> Self {
        let (tx, rx) = watch::channel(Utc::now());

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if tx.send(Utc::now()).is_err() {
                    break;
                }
            }
        });

        Self { now: rx, task }
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.now.borrow()
    }

    /// Receiver woken on every tick
    pub fn subscribe(&self) -> watch::Receiver<DateTime<Utc>> {
        self.now.clone()
    }

    pub fn label(&self, at: DateTime<Utc>) -> String {
        format_relative(at, self.now())
    }
}

impl Drop for RelativeClock {
    fn drop(&mut self) {
        self.task.abort();
    }
}
