//! Dashboard metrics service

use async_trait::async_trait;

use crate::{
    api::ApiClient,
    error::ApiError,
    models::{DashboardFilter, LoanMetrics},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn loan_metrics(&self, filter: &DashboardFilter) -> Result<LoanMetrics, ApiError>;
}

#[derive(Clone)]
pub struct DashboardService {
    client: ApiClient,
}

impl DashboardService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DashboardApi for DashboardService {
    async fn loan_metrics(&self, filter: &DashboardFilter) -> Result<LoanMetrics, ApiError> {
        self.client
            .get_json("/api/dashboard/loan-metrics", &filter.query_pairs())
            .await
    }
}
