//! HTTP transport for the loan slip backend
//!
//! Every request goes through [`ApiClient`], which attaches the bearer
//! token, unwraps success bodies and normalizes every failure into an
//! [`ApiError`](crate::error::ApiError).

pub mod client;

pub use client::{ApiClient, BearerToken};
