//! Loan Desk
//!
//! Headless client core for the loan slip administration dashboard: typed
//! resource services over the REST backend, validation rulesets for the
//! create/update forms, and the state controllers the presentation layer
//! renders from (list query, list/detail board, notification feed).

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod schemas;
pub mod services;
pub mod session;
pub mod state;

pub use config::AppConfig;
pub use error::{ApiError, AppError, AppResult, ErrorCode};
