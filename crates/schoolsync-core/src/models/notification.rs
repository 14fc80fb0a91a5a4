use serde::{Deserialize, Serialize};

use super::RawRecord;

/// Label shown instead of an empty time when a notification has no usable timestamp.
pub const JUST_NOW_LABEL: &str = "Just now";

/// Semantic tag that drives how a notification is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    #[default]
    Default,
    Create,
    Delete,
    Failed,
}

impl NotificationVariant {
    /// Short marker used by text front ends.
    pub fn marker(&self) -> &'static str {
        match self {
            NotificationVariant::Default => "•",
            NotificationVariant::Create => "+",
            NotificationVariant::Delete => "-",
            NotificationVariant::Failed => "!",
        }
    }
}

impl std::fmt::Display for NotificationVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationVariant::Default => write!(f, "default"),
            NotificationVariant::Create => write!(f, "create"),
            NotificationVariant::Delete => write!(f, "delete"),
            NotificationVariant::Failed => write!(f, "failed"),
        }
    }
}

/// A notification in canonical display form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    /// Stable across refreshes when the record carries an identifier.
    pub id: String,
    pub title: String,
    pub message: String,
    pub display_time: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub variant: NotificationVariant,
    /// Resolved timestamp in epoch milliseconds; `None` sorts as the epoch.
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub source_record: RawRecord,
}

impl NotificationView {
    pub fn sort_key(&self) -> i64 {
        self.timestamp_ms.unwrap_or(0)
    }
}

/// Sort recency-first. Stable, so equal timestamps keep their input order.
pub fn sort_recent_first(views: &mut [NotificationView]) {
    views.sort_by_key(|v| std::cmp::Reverse(v.sort_key()));
}

/// True when both lists show the same notifications in the same order with
/// the same read flags. Used to suppress no-op poll updates.
pub fn same_identity_and_read(a: &[NotificationView], b: &[NotificationView]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| x.id == y.id && x.read == y.read)
}

pub fn unread_count(views: &[NotificationView]) -> usize {
    views.iter().filter(|v| !v.read).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view(id: &str, ts: Option<i64>, read: bool) -> NotificationView {
        NotificationView {
            id: id.to_string(),
            title: id.to_string(),
            message: String::new(),
            display_time: JUST_NOW_LABEL.to_string(),
            read,
            variant: NotificationVariant::Default,
            timestamp_ms: ts,
            source_record: json!({}),
        }
    }

    #[test]
    fn test_sort_recent_first_is_stable() {
        let mut views = vec![
            view("old", Some(10), false),
            view("tie-a", Some(50), false),
            view("none", None, false),
            view("tie-b", Some(50), false),
            view("new", Some(90), false),
        ];
        sort_recent_first(&mut views);
        let ids: Vec<&str> = views.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "tie-a", "tie-b", "old", "none"]);
    }

    #[test]
    fn test_same_identity_and_read() {
        let a = vec![view("1", Some(1), false), view("2", Some(2), true)];
        let mut b = a.clone();
        b[0].title = "changed title".to_string();
        assert!(same_identity_and_read(&a, &b));

        b[1].read = false;
        assert!(!same_identity_and_read(&a, &b));

        let reordered = vec![a[1].clone(), a[0].clone()];
        assert!(!same_identity_and_read(&a, &reordered));
        assert!(!same_identity_and_read(&a, &a[..1]));
    }

    #[test]
    fn test_unread_count() {
        let views = vec![view("1", None, false), view("2", None, true)];
        assert_eq!(unread_count(&views), 1);
    }
}
