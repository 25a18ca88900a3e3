//! Reporting core for the account-manager dashboard.
//!
//! Identity resolution, role-based scoping of metric reads, and the
//! aggregation behind the account-manager and management views.

pub mod aggregation;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod import;
pub mod metrics;
pub mod month;
pub mod policy;
pub mod principal;
pub mod rng;
pub mod seed;
pub mod store;
pub mod types;
