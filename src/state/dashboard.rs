//! Dashboard filter and metrics

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{DashboardFilter, DashboardPeriod, LoanMetrics},
    services::DashboardApi,
};

/// Period selector plus optional explicit range
///
/// The range takes effect only once both bounds are set. While it is in
/// effect the period choice is kept but not sent, and clearing the range
/// falls back to it.
pub struct DashboardController {
    api: Arc<dyn DashboardApi>,
    period: DashboardPeriod,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    metrics: Option<LoanMetrics>,
}

impl DashboardController {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self {
            api,
            period: DashboardPeriod::default(),
            from: None,
            to: None,
            metrics: None,
        }
    }

    /// The filter the metrics are fetched with
    pub fn current(&self) -> DashboardFilter {
        match (self.from, self.to) {
            (Some(from), Some(to)) => DashboardFilter::Range { from, to },
            _ => DashboardFilter::Period(self.period),
        }
    }

    pub fn period(&self) -> DashboardPeriod {
        self.period
    }

    pub fn is_using_range(&self) -> bool {
        matches!(self.current(), DashboardFilter::Range { .. })
    }

    pub fn metrics(&self) -> Option<LoanMetrics> {
        self.metrics
    }

    /// Each setter returns the new filter when the effective one changed
    pub fn set_period(&mut self, period: DashboardPeriod) -> Option<DashboardFilter> {
        self.apply(|c| c.period = period)
    }

    pub fn set_from(&mut self, from: Option<NaiveDate>) -> Option<DashboardFilter> {
        self.apply(|c| c.from = from)
    }

    pub fn set_to(&mut self, to: Option<NaiveDate>) -> Option<DashboardFilter> {
        self.apply(|c| c.to = to)
    }

    pub fn clear_range(&mut self) -> Option<DashboardFilter> {
        self.apply(|c| {
            c.from = None;
            c.to = None;
        })
    }

    fn apply(&mut self, change: impl FnOnce(&mut Self)) -> Option<DashboardFilter> {
        let before = self.current();
        change(self);
        let after = self.current();
        (after != before).then_some(after)
    }

    /// Fetch metrics for the current filter; prior metrics stay on failure
    pub async fn refresh(&mut self) -> AppResult<LoanMetrics> {
        let filter = self.current();
        let metrics = self.api.loan_metrics(&filter).await.map_err(|e| {
            tracing::warn!("Failed to load loan metrics for {:?}: {}", filter, e);
            e
        })?;
        self.metrics = Some(metrics);
        Ok(metrics)
    }
}
