//! Client-side validation rulesets
//!
//! Validation runs synchronously against the full form before any request
//! is built.

pub mod loan_slip;
pub mod login;

pub use loan_slip::{CreateLoanSlipForm, UpdateLoanSlipForm, ACCEPTED_IMAGE_TYPES, MAX_IMAGES, MAX_IMAGE_SIZE};
pub use login::LoginForm;
