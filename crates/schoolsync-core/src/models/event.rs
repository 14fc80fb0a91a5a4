use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RawRecord;
use crate::normalize::{fields::first_text, timestamp};
use crate::utils::format_date;

const TITLE_KEYS: &[&str] = &["title", "name", "eventName", "summary"];

const START_KEYS: &[&str] = &["start", "startDate", "start_date", "date", "eventDate"];

const LOCATION_KEYS: &[&str] = &["location", "venue", "place"];

/// Display projection of a calendar event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Option<String>,
    pub title: String,
    pub start: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl EventSummary {
    pub fn from_record(record: &RawRecord) -> Self {
        Self {
            id: first_text(record, &["id", "_id", "eventId"]),
            title: first_text(record, TITLE_KEYS).unwrap_or_else(|| "Untitled event".to_string()),
            start: timestamp::resolve_from_keys(record, START_KEYS),
            location: first_text(record, LOCATION_KEYS),
        }
    }

    pub fn formatted_date(&self) -> String {
        match &self.start {
            Some(start) => format_date(start),
            None => "TBD".to_string(),
        }
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start.map(|s| s >= now).unwrap_or(false)
    }
}

/// Request body for creating a calendar entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Events sorted soonest first; undated events go last.
pub fn upcoming_first(events: &[RawRecord]) -> Vec<EventSummary> {
    let mut summaries: Vec<EventSummary> = events.iter().map(EventSummary::from_record).collect();
    summaries.sort_by_key(|e| (e.start.is_none(), e.start));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_record_fallbacks() {
        let event = EventSummary::from_record(&json!({
            "_id": "e1",
            "eventName": "Science Fair",
            "startDate": "2024-05-01T09:00:00Z",
            "venue": "Main hall"
        }));
        assert_eq!(event.id.as_deref(), Some("e1"));
        assert_eq!(event.title, "Science Fair");
        assert_eq!(event.location.as_deref(), Some("Main hall"));
        assert!(event.start.is_some());
    }

    #[test]
    fn test_new_event_skips_empty_fields() {
        let event = NewEvent {
            title: "PTA meeting".to_string(),
            start: "2024-05-01T18:00:00Z".to_string(),
            end: None,
            location: Some("Library".to_string()),
            description: None,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"title": "PTA meeting", "start": "2024-05-01T18:00:00Z", "location": "Library"})
        );
    }

    #[test]
    fn test_undated_event() {
        let event = EventSummary::from_record(&json!({}));
        assert_eq!(event.title, "Untitled event");
        assert_eq!(event.formatted_date(), "TBD");
        assert!(!event.is_upcoming(Utc::now()));
    }

    #[test]
    fn test_upcoming_first_ordering() {
        let events = vec![
            json!({"title": "later", "date": "2024-06-01"}),
            json!({"title": "undated"}),
            json!({"title": "sooner", "date": "2024-05-01"}),
        ];
        let titles: Vec<String> = upcoming_first(&events).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["sooner", "later", "undated"]);
    }
}
