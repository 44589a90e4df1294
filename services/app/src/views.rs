//! services/app/src/views.rs
//!
//! Read-only presentational renderers for the terminal frontend. These
//! assemble strings from backend data plus the notification engine's
//! derived state; they never perform I/O themselves.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use edudash_core::domain::{Assignment, Material};
use edudash_core::notifications::{
    days_until_deadline, deadline_label, is_newly_assigned, is_urgent, relative_time,
    relevant_assignments, unseen_count,
};

/// Badges for one assignment row in the list views.
fn badges(assignment: &Assignment, now: DateTime<Utc>) -> String {
    let mut parts = Vec::new();
    if is_newly_assigned(assignment.created_at, now) {
        parts.push("New");
    }
    if days_until_deadline(assignment.due_date, now) < 0 {
        parts.push("Overdue");
    } else if is_urgent(assignment.due_date, now) {
        parts.push("Urgent");
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" [{}]", parts.join(", "))
    }
}

/// The student dashboard: every assignment with its status badges and
/// deadline label.
pub fn render_assignments(assignments: &[Assignment], now: DateTime<Utc>) -> String {
    if assignments.is_empty() {
        return "No assignments found.\n".to_string();
    }
    let mut out = String::new();
    for a in assignments {
        let points = a
            .points
            .map(|p| format!(" • {} pts", p))
            .unwrap_or_default();
        out.push_str(&format!(
            "{}{}\n  {}{} • {}\n",
            a.title,
            badges(a, now),
            a.course_label(),
            points,
            deadline_label(a.due_date, now),
        ));
    }
    out
}

/// The teacher material listing: visibility, size, and usage counters.
pub fn render_materials(materials: &[Material]) -> String {
    if materials.is_empty() {
        return "No materials found.\n".to_string();
    }
    let mut out = String::new();
    for m in materials {
        let visibility = if m.is_public { "public" } else { "private" };
        out.push_str(&format!(
            "{} ({}, {})\n  {} views • {} downloads",
            m.title,
            visibility,
            human_size(m.file_size),
            m.view_count,
            m.download_count,
        ));
        if !m.tags.is_empty() {
            out.push_str(&format!(" • tags: {}", m.tags.join(", ")));
        }
        out.push('\n');
    }
    out
}

/// The reminder panel: relevant assignments with unseen markers and a
/// relative-time stamp on the newly assigned ones.
pub fn render_notifications(
    assignments: &[Assignment],
    seen: &HashSet<String>,
    now: DateTime<Utc>,
) -> String {
    let relevant = relevant_assignments(assignments, now);
    if relevant.is_empty() {
        return "All caught up! No urgent assignments or new reminders at the moment.\n"
            .to_string();
    }

    let mut out = format!(
        "Reminders ({}, {} unseen)\n",
        relevant.len(),
        unseen_count(&relevant, seen)
    );
    for a in &relevant {
        let marker = if seen.contains(&a.id) { " " } else { "*" };
        let assigned = if is_newly_assigned(a.created_at, now) {
            format!(" • assigned {}", relative_time(a.created_at, now))
        } else {
            String::new()
        };
        out.push_str(&format!(
            "{} {}{}\n    {} • {}{}\n",
            marker,
            a.title,
            badges(a, now),
            a.course_label(),
            deadline_label(a.due_date, now),
            assigned,
        ));
    }
    out
}

fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn assignment(id: &str, created: DateTime<Utc>, due: DateTime<Utc>) -> Assignment {
        Assignment {
            id: id.to_string(),
            title: format!("Assignment {id}"),
            description: String::new(),
            due_date: due,
            created_at: created,
            course_name: None,
            points: None,
        }
    }

    #[test]
    fn overdue_items_show_in_lists_even_when_absent_from_reminders() {
        let overdue = assignment("a", now() - Duration::days(10), now() - Duration::days(5));
        let listing = render_assignments(std::slice::from_ref(&overdue), now());
        assert!(listing.contains("[Overdue]"));
        assert!(listing.contains("Overdue by 5 days"));

        let panel = render_notifications(&[overdue], &HashSet::new(), now());
        assert!(panel.contains("All caught up!"));
    }

    #[test]
    fn unseen_items_are_marked() {
        let fresh = assignment("a", now() - Duration::hours(2), now() + Duration::days(1));
        let panel = render_notifications(std::slice::from_ref(&fresh), &HashSet::new(), now());
        assert!(panel.contains("1 unseen"));
        assert!(panel.contains("* Assignment a"));
        assert!(panel.contains("assigned 2 hours ago"));

        let seen: HashSet<String> = ["a".to_string()].into();
        let panel = render_notifications(&[fresh], &seen, now());
        assert!(panel.contains("0 unseen"));
    }

    #[test]
    fn missing_course_defaults_to_general() {
        let a = assignment("a", now() - Duration::hours(2), now() + Duration::days(5));
        assert!(render_assignments(&[a], now()).contains("General"));
    }

    #[test]
    fn empty_states_render_friendly_text() {
        assert_eq!(render_assignments(&[], now()), "No assignments found.\n");
        assert_eq!(render_materials(&[]), "No materials found.\n");
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
