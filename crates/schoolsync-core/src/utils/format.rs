use chrono::{DateTime, Local, Utc};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a timestamp for list display in local time: "Mar 01, 2024 10:00"
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%b %d, %Y %H:%M").to_string()
}

/// Format a timestamp as a date only: "Mar 01, 2024"
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%b %d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Grüße aus Köln", 8), "Grüße...");
    }

    #[test]
    fn test_format_datetime_shape() {
        let dt = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let formatted = format_datetime(&dt);
        // Local timezone varies; the shape does not.
        assert!(formatted.contains("2023"));
        assert_eq!(formatted.len(), "Nov 14, 2023 22:13".len());
    }
}
