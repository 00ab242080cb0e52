//! Dashboard metrics model and filter

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::format_wire;

/// Coarse preset time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardPeriod {
    Today,
    Week,
    #[default]
    Month,
    Year,
}

impl DashboardPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            DashboardPeriod::Today => "today",
            DashboardPeriod::Week => "week",
            DashboardPeriod::Month => "month",
            DashboardPeriod::Year => "year",
        }
    }
}

/// Time window of the metrics: a preset period or an explicit range, never both
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardFilter {
    Period(DashboardPeriod),
    Range { from: NaiveDate, to: NaiveDate },
}

impl Default for DashboardFilter {
    fn default() -> Self {
        DashboardFilter::Period(DashboardPeriod::default())
    }
}

impl DashboardFilter {
    /// Query string of `GET /api/dashboard/loan-metrics`
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            DashboardFilter::Period(period) => vec![("period", period.as_str().to_string())],
            DashboardFilter::Range { from, to } => {
                vec![("from", format_wire(*from)), ("to", format_wire(*to))]
            }
        }
    }
}

/// Aggregate loan counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanMetrics {
    pub total: u64,
    pub borrowing: u64,
    pub returned: u64,
    pub overdue: u64,
}
