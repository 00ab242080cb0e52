//! Client-side state the presentation layer renders from
//!
//! The query controller owns what the user asked for; the board, the
//! notification feed and the dashboard controller own what came back.

pub mod dashboard;
pub mod loan_slips;
pub mod notifications;
pub mod query;

pub use dashboard::DashboardController;
pub use loan_slips::{BoardSnapshot, CreateOutcome, LoadOutcome, LoanSlipBoard};
pub use notifications::{format_relative, FeedSnapshot, NotificationFeed, RelativeClock};
pub use query::{QueryController, QueryPatch};
