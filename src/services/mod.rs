//! Resource services
//!
//! Each service wraps one REST resource: it builds the request payload,
//! calls the transport and unwraps the response. Services hold no state.
//! The traits are the seams the state controllers depend on.

pub mod auth;
pub mod dashboard;
pub mod loan_slips;
pub mod notifications;

use std::sync::Arc;

use crate::api::ApiClient;

pub use auth::{AuthApi, AuthService};
pub use dashboard::{DashboardApi, DashboardService};
pub use loan_slips::{LoanSlipApi, LoanSlipService};
pub use notifications::{NotificationApi, NotificationService};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthApi>,
    pub loan_slips: Arc<dyn LoanSlipApi>,
    pub notifications: Arc<dyn NotificationApi>,
    pub dashboard: Arc<dyn DashboardApi>,
}

impl Services {
    /// Create all services over the given client
    pub fn new(client: ApiClient) -> Self {
        Self {
            auth: Arc::new(AuthService::new(client.clone())),
            loan_slips: Arc::new(LoanSlipService::new(client.clone())),
            notifications: Arc::new(NotificationService::new(client.clone())),
            dashboard: Arc::new(DashboardService::new(client)),
        }
    }
}
