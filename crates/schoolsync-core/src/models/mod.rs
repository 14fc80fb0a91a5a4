//! Data models for dashboard entities.
//!
//! This module contains the strict types produced by normalization and the
//! aggregate state the orchestrator owns:
//!
//! - `Source`: the five backend collections a sync cycle reads
//! - `NormalizedPerson`, `DataIssue`, `GroupTally`: enrolled-person roster data
//! - `NotificationView`, `NotificationVariant`: display-ready notifications
//! - `EventSummary`: display projection of a calendar event
//! - `AggregateSnapshot`: the full cacheable dashboard state

pub mod event;
pub mod notification;
pub mod person;
pub mod snapshot;
pub mod source;

pub use event::{EventSummary, NewEvent};
pub use notification::{NotificationVariant, NotificationView, JUST_NOW_LABEL};
pub use person::{issue_summary, DataIssue, GroupTally, IssueKind, NormalizedPerson, PLACEHOLDER_PREFIX};
pub use snapshot::AggregateSnapshot;
pub use source::Source;

/// An opaque record from an external source. Usually a JSON object, but
/// nothing about its shape is guaranteed.
pub type RawRecord = serde_json::Value;
