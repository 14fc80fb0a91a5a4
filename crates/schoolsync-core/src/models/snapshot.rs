use serde::{Deserialize, Serialize};

use super::{DataIssue, GroupTally, NotificationView, RawRecord};

/// The full cacheable dashboard state produced by one successful sync.
///
/// Every field defaults when absent so a snapshot written by an older build
/// still reads back; nothing here is versioned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateSnapshot {
    pub events: Vec<RawRecord>,
    pub teacher_count: usize,
    pub person_count: usize,
    pub group_tally: GroupTally,
    pub issues: Vec<DataIssue>,
    pub notifications: Vec<NotificationView>,
    pub results: Vec<RawRecord>,
    pub result_count: usize,
}

impl AggregateSnapshot {
    pub fn unread_notifications(&self) -> usize {
        super::notification::unread_count(&self.notifications)
    }

    /// Number of persons with a group assigned.
    pub fn grouped_person_count(&self) -> usize {
        self.group_tally.values().sum()
    }
}
