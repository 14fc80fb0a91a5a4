//! REST API client module for the dashboard backend.
//!
//! This module provides the `ApiClient` for fetching the five source
//! collections (events, staff, students, notifications, results) and the
//! `DashboardApi` trait the sync engine is written against.

pub mod client;
pub mod error;

pub use client::{ApiClient, DashboardApi, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
