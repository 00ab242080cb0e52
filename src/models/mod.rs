//! Data models for Loan Desk

pub mod dashboard;
pub mod dates;
pub mod enums;
pub mod loan_slip;
pub mod notification;
pub mod user;

// Re-export commonly used types
pub use dashboard::{DashboardFilter, DashboardPeriod, LoanMetrics};
pub use enums::{LoanStatus, Role, UpdateScope};
pub use loan_slip::{
    total_pages, CreateLoanSlip, ImageUpload, LoanSlip, LoanSlipPage, LoanSlipQuery, SortField,
    SortOrder, UpdateLoanSlip,
};
pub use notification::{
    MarkReadResponse, Notification, NotificationPage, NotificationPayload, NotificationType, UnreadCount,
};
pub use user::{CurrentUser, LoginRequest, LoginResponse};
