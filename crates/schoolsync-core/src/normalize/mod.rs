//! Tolerant parsing of backend payloads.
//!
//! Everything shape-ambiguous stays in here: envelopes are reduced to record
//! lists (`shape`), person records to `NormalizedPerson` plus data issues
//! (`entity`), and notification records to `NotificationView` (`notification`).
//! Code outside this module only sees the strict types.

pub mod entity;
pub mod fields;
pub mod notification;
pub mod shape;
pub mod timestamp;

pub use entity::{classify, Classification};
pub use notification::FormatError;
pub use shape::normalize;
