//! Plain-text projections of the dashboard state.

use std::io::{self, Write};

use chrono::Utc;
use schoolsync_core::cache::CachedData;
use schoolsync_core::models::event::upcoming_first;
use schoolsync_core::models::{issue_summary, AggregateSnapshot, NotificationView, Source};
use schoolsync_core::sync::{DashboardState, SyncPhase};
use schoolsync_core::utils::truncate_string;

const MAX_EVENTS: usize = 5;
const MAX_ISSUES: usize = 10;
const MAX_NOTIFICATIONS: usize = 10;
const TITLE_WIDTH: usize = 48;

const UNAVAILABLE: &str = "No data (source unavailable)";

pub fn dashboard(out: &mut impl Write, state: &DashboardState) -> io::Result<()> {
    writeln!(out, "{}", status_line(state))?;
    if let Some(ref error) = state.error {
        writeln!(out, "  {}", error)?;
    }
    let snapshot = &state.snapshot;

    section(out, "Upcoming events")?;
    if state.is_degraded(Source::Events) {
        writeln!(out, "  {}", UNAVAILABLE)?;
    } else {
        events(out, snapshot)?;
    }

    section(out, "Staff")?;
    if state.is_degraded(Source::Staff) {
        writeln!(out, "  {}", UNAVAILABLE)?;
    } else {
        writeln!(out, "  {} teachers", snapshot.teacher_count)?;
    }

    section(out, "Students")?;
    if state.is_degraded(Source::Persons) {
        writeln!(out, "  {}", UNAVAILABLE)?;
    } else {
        students(out, snapshot)?;
    }

    section(out, "Notifications")?;
    if state.is_degraded(Source::Notifications) {
        writeln!(out, "  {}", UNAVAILABLE)?;
    } else {
        notifications(out, &snapshot.notifications)?;
    }

    section(out, "Results")?;
    if state.is_degraded(Source::Results) {
        writeln!(out, "  {}", UNAVAILABLE)?;
    } else {
        writeln!(out, "  {} results recorded", snapshot.result_count)?;
    }
    Ok(())
}

pub fn status_line(state: &DashboardState) -> String {
    let phase = match state.phase {
        SyncPhase::Idle => "Not loaded",
        SyncPhase::CacheHydrated => "Cached",
        SyncPhase::Fetching => "Syncing",
        SyncPhase::Succeeded => "Up to date",
        SyncPhase::PartiallyFailed => "Partially updated",
        SyncPhase::Failed => "Sync failed",
    };
    match state.cached_at {
        Some(cached_at) => format!(
            "{} (showing data cached {})",
            phase,
            CachedData { data: (), cached_at }.age_display()
        ),
        None => phase.to_string(),
    }
}

pub fn notifications(out: &mut impl Write, list: &[NotificationView]) -> io::Result<()> {
    if list.is_empty() {
        return writeln!(out, "  No notifications");
    }
    let unread = list.iter().filter(|n| !n.read).count();
    writeln!(out, "  {} unread of {}", unread, list.len())?;
    for n in list.iter().take(MAX_NOTIFICATIONS) {
        writeln!(
            out,
            "  {} {} {:<width$} {}  [{}]",
            n.variant.marker(),
            if n.read { " " } else { "*" },
            truncate_string(&n.title, TITLE_WIDTH),
            n.display_time,
            n.id,
            width = TITLE_WIDTH,
        )?;
        if !n.message.is_empty() {
            writeln!(out, "      {}", truncate_string(&n.message, TITLE_WIDTH * 2))?;
        }
    }
    if list.len() > MAX_NOTIFICATIONS {
        writeln!(out, "  ... {} more", list.len() - MAX_NOTIFICATIONS)?;
    }
    Ok(())
}

fn events(out: &mut impl Write, snapshot: &AggregateSnapshot) -> io::Result<()> {
    let now = Utc::now();
    let upcoming: Vec<_> = upcoming_first(&snapshot.events)
        .into_iter()
        .filter(|e| e.start.is_none() || e.is_upcoming(now))
        .take(MAX_EVENTS)
        .collect();
    if upcoming.is_empty() {
        return writeln!(out, "  No upcoming events");
    }
    for event in upcoming {
        write!(
            out,
            "  {:<12} {}",
            event.formatted_date(),
            truncate_string(&event.title, TITLE_WIDTH)
        )?;
        match event.location {
            Some(ref location) => writeln!(out, " @ {}", location)?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

fn students(out: &mut impl Write, snapshot: &AggregateSnapshot) -> io::Result<()> {
    writeln!(
        out,
        "  {} enrolled, {} with a class",
        snapshot.person_count,
        snapshot.grouped_person_count()
    )?;
    for (group, count) in &snapshot.group_tally {
        writeln!(out, "    {:<12} {}", group, count)?;
    }
    if snapshot.issues.is_empty() {
        return Ok(());
    }
    writeln!(out, "  Data issues: {}", issue_summary(&snapshot.issues))?;
    for issue in snapshot.issues.iter().take(MAX_ISSUES) {
        writeln!(
            out,
            "    {:<18} {:<20} {}",
            issue.identity,
            truncate_string(issue.display_name.as_deref().unwrap_or("-"), 20),
            issue.problem
        )?;
    }
    if snapshot.issues.len() > MAX_ISSUES {
        writeln!(out, "    ... {} more", snapshot.issues.len() - MAX_ISSUES)?;
    }
    Ok(())
}

fn section(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolsync_core::models::{DataIssue, IssueKind, NotificationVariant};
    use serde_json::json;
    use std::sync::Arc;

    fn render(state: &DashboardState) -> String {
        let mut out = Vec::new();
        dashboard(&mut out, state).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn notification(id: &str, read: bool) -> NotificationView {
        NotificationView {
            id: id.to_string(),
            title: format!("Student {} created", id),
            message: String::new(),
            display_time: "Just now".to_string(),
            read,
            variant: NotificationVariant::Create,
            timestamp_ms: None,
            source_record: json!({}),
        }
    }

    #[test]
    fn test_degraded_sections_show_no_data() {
        let state = DashboardState {
            phase: SyncPhase::PartiallyFailed,
            degraded: vec![Source::Staff],
            snapshot: Arc::new(AggregateSnapshot {
                person_count: 4,
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = render(&state);
        assert!(text.starts_with("Partially updated"));
        assert!(text.contains(&format!("Staff\n  {}", UNAVAILABLE)));
        assert!(text.contains("4 enrolled"));
    }

    #[test]
    fn test_failed_sync_keeps_showing_previous_data() {
        let state = DashboardState {
            phase: SyncPhase::Failed,
            error: Some("Could not load dashboard data".to_string()),
            cached_at: Some(Utc::now()),
            snapshot: Arc::new(AggregateSnapshot {
                teacher_count: 7,
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = render(&state);
        assert!(text.starts_with("Sync failed (showing data cached just now)"));
        assert!(text.contains("Could not load dashboard data"));
        assert!(text.contains("7 teachers"));
        assert!(!text.contains(UNAVAILABLE));
    }

    #[test]
    fn test_notifications_listing() {
        let mut out = Vec::new();
        notifications(&mut out, &[notification("n1", false), notification("n2", true)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1 unread of 2"));
        assert!(text.contains("+ * Student n1 created"));
        assert!(text.contains("[n2]"));
    }

    #[test]
    fn test_issues_listing() {
        let mut snapshot = AggregateSnapshot {
            person_count: 1,
            ..Default::default()
        };
        snapshot.issues.push(DataIssue {
            identity: "S9".to_string(),
            display_name: None,
            problem: IssueKind::MissingName,
            source_record: json!({"studentId": "S9"}),
        });
        let state = DashboardState {
            phase: SyncPhase::Succeeded,
            snapshot: Arc::new(snapshot),
            ..Default::default()
        };
        let text = render(&state);
        assert!(text.contains("1 issue across 1 student"));
        assert!(text.contains("Missing name"));
    }

    #[test]
    fn test_status_line_mentions_cache() {
        let state = DashboardState {
            phase: SyncPhase::CacheHydrated,
            cached_at: Some(Utc::now()),
            ..Default::default()
        };
        assert_eq!(status_line(&state), "Cached (showing data cached just now)");
    }
}
