//! crates/edudash_core/src/notifications.rs
//!
//! The notification relevance engine: decides which assignments deserve
//! surfacing as a reminder, and tracks which of them the user has already
//! acknowledged across sessions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::Assignment;
use crate::ports::KeyValueStore;

/// The local storage key holding the JSON array of acknowledged ids.
pub const SEEN_ASSIGNMENTS_KEY: &str = "seenAssignments";

const MS_PER_DAY: i64 = 86_400_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;

//=========================================================================================
// Relevance Predicates
//=========================================================================================

/// Whole days until the deadline: `ceil((due_date - now) / 1 day)`.
///
/// Negative when overdue, zero when due within the current day, positive
/// otherwise. An assignment due in 47 hours counts as 2 days out.
pub fn days_until_deadline(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (due_date - now).num_milliseconds();
    let mut days = ms.div_euclid(MS_PER_DAY);
    if ms.rem_euclid(MS_PER_DAY) != 0 {
        days += 1;
    }
    days
}

/// Whether an assignment was created within the last 24 hours.
pub fn is_newly_assigned(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now - created_at).num_milliseconds() <= 24 * MS_PER_HOUR
}

/// Whether an assignment is due within two days and not yet overdue.
pub fn is_urgent(due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let days = days_until_deadline(due_date, now);
    (0..=2).contains(&days)
}

/// Filters the full assignment list down to the reminder-worthy subset:
/// newly assigned OR due within two days. Input order is preserved.
///
/// The dual criterion surfaces both freshness and urgency without
/// duplicating all pending work. Assignments already overdue fail the
/// urgency arm here even though list views still flag them as overdue;
/// the two predicates are intentionally independent.
pub fn relevant_assignments(assignments: &[Assignment], now: DateTime<Utc>) -> Vec<Assignment> {
    assignments
        .iter()
        .filter(|a| is_newly_assigned(a.created_at, now) || is_urgent(a.due_date, now))
        .cloned()
        .collect()
}

//=========================================================================================
// Seen-State Tracking
//=========================================================================================

/// Persistent acknowledged-notification state, keyed by assignment id.
///
/// Backed by a [`KeyValueStore`] under [`SEEN_ASSIGNMENTS_KEY`]. The set
/// only ever grows; the sole way to shrink it is clearing the whole store
/// (e.g. on logout). Writes are best-effort: if the store rejects the
/// write, seen-state simply does not survive a reload.
pub struct SeenStore<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> SeenStore<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Loads the persisted seen set; a missing or corrupt value yields an
    /// empty set rather than an error.
    pub fn load(&self) -> HashSet<String> {
        let Some(raw) = self.store.get(SEEN_ASSIGNMENTS_KEY) else {
            return HashSet::new();
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!("Discarding unreadable seen-state: {e}");
                HashSet::new()
            }
        }
    }

    /// Marks every relevant assignment as seen and persists the result.
    ///
    /// Returns the union of the previous seen set and the relevant ids, so
    /// acknowledgements are never lost when an item drops out of the
    /// relevant window. Idempotent.
    pub fn mark_all_seen(
        &self,
        relevant: &[Assignment],
        seen: &HashSet<String>,
    ) -> HashSet<String> {
        let mut updated = seen.clone();
        updated.extend(relevant.iter().map(|a| a.id.clone()));

        let mut ids: Vec<&String> = updated.iter().collect();
        ids.sort();
        match serde_json::to_string(&ids) {
            Ok(json) => {
                if let Err(e) = self.store.set(SEEN_ASSIGNMENTS_KEY, &json) {
                    warn!("Failed to persist seen-state: {e}");
                }
            }
            Err(e) => warn!("Failed to serialize seen-state: {e}"),
        }
        updated
    }
}

/// How many relevant notifications the user has not yet acknowledged.
pub fn unseen_count(relevant: &[Assignment], seen: &HashSet<String>) -> usize {
    relevant.iter().filter(|a| !seen.contains(&a.id)).count()
}

//=========================================================================================
// Presentation Helpers
//=========================================================================================

/// Coarse relative-time label for "newly assigned" badges.
///
/// Under an hour it counts minutes, under a day hours, otherwise days.
/// No week or month units. A timestamp ahead of `now` (clock skew between
/// client and backend) clamps to "0 minutes ago".
pub fn relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let ms = (now - date).num_milliseconds().max(0);
    let minutes = ms.div_euclid(MS_PER_MINUTE);
    let hours = ms.div_euclid(MS_PER_HOUR);
    let days = ms.div_euclid(MS_PER_DAY);

    if minutes < 60 {
        format!("{} minute{} ago", minutes, plural_s(minutes))
    } else if hours < 24 {
        format!("{} hour{} ago", hours, plural_s(hours))
    } else {
        format!("{} day{} ago", days, plural_s(days))
    }
}

fn plural_s(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Deadline classification used by the assignment list views. This is a
/// separate predicate from notification relevance: an item overdue by a
/// week is flagged here but absent from the reminder panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    Overdue { days: i64 },
    DueToday,
    DueTomorrow,
    DueInDays { days: i64 },
}

pub fn deadline_status(due_date: DateTime<Utc>, now: DateTime<Utc>) -> DeadlineStatus {
    match days_until_deadline(due_date, now) {
        d if d < 0 => DeadlineStatus::Overdue { days: -d },
        0 => DeadlineStatus::DueToday,
        1 => DeadlineStatus::DueTomorrow,
        d => DeadlineStatus::DueInDays { days: d },
    }
}

/// The user-facing label for a deadline.
pub fn deadline_label(due_date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match deadline_status(due_date, now) {
        DeadlineStatus::Overdue { days } => {
            format!("Overdue by {} {}", days, if days == 1 { "day" } else { "days" })
        }
        DeadlineStatus::DueToday => "Due today!".to_string(),
        DeadlineStatus::DueTomorrow => "Due tomorrow".to_string(),
        DeadlineStatus::DueInDays { days } => format!("Due in {} days", days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

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
            points: Some(100),
        }
    }

    /// A store that can be told to reject writes, for the degraded path.
    struct TestStore {
        data: Mutex<std::collections::HashMap<String, String>>,
        fail_writes: bool,
    }

    impl TestStore {
        fn new() -> Self {
            Self {
                data: Mutex::new(Default::default()),
                fail_writes: false,
            }
        }

        fn failing() -> Self {
            Self {
                data: Mutex::new(Default::default()),
                fail_writes: true,
            }
        }
    }

    impl KeyValueStore for TestStore {
        fn get(&self, key: &str) -> Option<String> {
            self.data.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) -> crate::ports::PortResult<()> {
            if self.fail_writes {
                return Err(crate::ports::PortError::Unexpected("quota exceeded".into()));
            }
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) {
            self.data.lock().unwrap().remove(key);
        }
    }

    #[test]
    fn days_until_deadline_rounds_up() {
        // 47 hours out still counts as 2 days.
        assert_eq!(days_until_deadline(now() + Duration::hours(47), now()), 2);
        assert_eq!(days_until_deadline(now() + Duration::hours(48), now()), 2);
        assert_eq!(days_until_deadline(now() + Duration::hours(49), now()), 3);
        assert_eq!(days_until_deadline(now() + Duration::minutes(1), now()), 1);
        assert_eq!(days_until_deadline(now(), now()), 0);
        assert_eq!(days_until_deadline(now() - Duration::minutes(1), now()), 0);
        assert_eq!(days_until_deadline(now() - Duration::hours(24), now()), -1);
        assert_eq!(days_until_deadline(now() - Duration::days(5), now()), -5);
    }

    #[test]
    fn new_assignments_are_relevant_regardless_of_due_date() {
        let a = assignment("a", now() - Duration::hours(3), now() + Duration::days(30));
        let relevant = relevant_assignments(&[a], now());
        assert_eq!(relevant.len(), 1);
    }

    #[test]
    fn exactly_24h_old_is_still_new() {
        let a = assignment("a", now() - Duration::hours(24), now() + Duration::days(30));
        assert_eq!(relevant_assignments(&[a], now()).len(), 1);
        let b = assignment("b", now() - Duration::hours(24) - Duration::seconds(1), now() + Duration::days(30));
        assert!(relevant_assignments(&[b], now()).is_empty());
    }

    #[test]
    fn due_within_two_days_is_relevant() {
        let old = now() - Duration::days(10);
        let due_2 = assignment("a", old, now() + Duration::days(2));
        let due_3 = assignment("b", old, now() + Duration::days(3));
        let relevant = relevant_assignments(&[due_2, due_3], now());
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant[0].id, "a");
    }

    #[test]
    fn overdue_items_are_excluded_from_reminders_but_flagged_in_lists() {
        let old = now() - Duration::days(10);
        let overdue = assignment("a", old, now() - Duration::days(5));
        assert!(relevant_assignments(&[overdue.clone()], now()).is_empty());
        assert_eq!(
            deadline_status(overdue.due_date, now()),
            DeadlineStatus::Overdue { days: 5 }
        );
        assert_eq!(deadline_label(overdue.due_date, now()), "Overdue by 5 days");
    }

    #[test]
    fn stale_and_distant_assignments_are_excluded() {
        let a = assignment("a", now() - Duration::days(3), now() + Duration::days(10));
        assert!(relevant_assignments(&[a], now()).is_empty());
    }

    #[test]
    fn input_order_is_preserved() {
        let fresh = now() - Duration::hours(1);
        let items = vec![
            assignment("z", fresh, now() + Duration::days(9)),
            assignment("a", fresh, now() + Duration::days(9)),
            assignment("m", fresh, now() + Duration::days(9)),
        ];
        let ids: Vec<_> = relevant_assignments(&items, now())
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, ["z", "a", "m"]);
    }

    #[test]
    fn mark_all_seen_is_idempotent_and_superset_only() {
        let store = TestStore::new();
        let seen_store = SeenStore::new(&store);
        let fresh = now() - Duration::hours(1);

        // Pre-existing acknowledgement that is no longer relevant.
        store
            .set(SEEN_ASSIGNMENTS_KEY, r#"["ancient"]"#)
            .unwrap();
        let seen = seen_store.load();
        assert!(seen.contains("ancient"));

        let relevant = vec![
            assignment("a", fresh, now() + Duration::days(1)),
            assignment("b", fresh, now() + Duration::days(2)),
        ];
        let once = seen_store.mark_all_seen(&relevant, &seen);
        let twice = seen_store.mark_all_seen(&relevant, &once);
        assert_eq!(once, twice);
        assert!(once.contains("ancient"));
        assert!(once.contains("a") && once.contains("b"));

        // Round-trips through the store.
        let reloaded = seen_store.load();
        assert_eq!(reloaded, once);
    }

    #[test]
    fn unseen_count_never_increases_after_mark_all_seen() {
        let store = TestStore::new();
        let seen_store = SeenStore::new(&store);
        let fresh = now() - Duration::hours(1);
        let relevant = vec![
            assignment("a", fresh, now() + Duration::days(1)),
            assignment("b", fresh, now() + Duration::days(1)),
        ];

        let seen = seen_store.load();
        assert_eq!(unseen_count(&relevant, &seen), 2);
        let seen = seen_store.mark_all_seen(&relevant, &seen);
        assert_eq!(unseen_count(&relevant, &seen), 0);
        let seen = seen_store.mark_all_seen(&relevant, &seen);
        assert_eq!(unseen_count(&relevant, &seen), 0);
    }

    #[test]
    fn storage_failure_is_swallowed() {
        let store = TestStore::failing();
        let seen_store = SeenStore::new(&store);
        let fresh = now() - Duration::hours(1);
        let relevant = vec![assignment("a", fresh, now() + Duration::days(1))];

        // The in-memory result still reflects the acknowledgement even
        // though nothing was persisted.
        let seen = seen_store.mark_all_seen(&relevant, &HashSet::new());
        assert!(seen.contains("a"));
        assert!(seen_store.load().is_empty());
    }

    #[test]
    fn corrupt_seen_state_loads_as_empty() {
        let store = TestStore::new();
        store.set(SEEN_ASSIGNMENTS_KEY, "not json at all").unwrap();
        assert!(SeenStore::new(&store).load().is_empty());
    }

    #[test]
    fn relative_time_units_and_plurals() {
        assert_eq!(relative_time(now() - Duration::minutes(1), now()), "1 minute ago");
        assert_eq!(relative_time(now() - Duration::minutes(59), now()), "59 minutes ago");
        assert_eq!(relative_time(now() - Duration::minutes(60), now()), "1 hour ago");
        assert_eq!(relative_time(now() - Duration::hours(23), now()), "23 hours ago");
        assert_eq!(relative_time(now() - Duration::hours(24), now()), "1 day ago");
        assert_eq!(relative_time(now() - Duration::days(120), now()), "120 days ago");
    }

    #[test]
    fn future_timestamps_clamp_to_zero_minutes() {
        assert_eq!(relative_time(now() + Duration::minutes(5), now()), "0 minutes ago");
        assert_eq!(relative_time(now() + Duration::hours(3), now()), "0 minutes ago");
    }

    #[test]
    fn deadline_labels() {
        assert_eq!(deadline_label(now() - Duration::days(1), now()), "Overdue by 1 day");
        assert_eq!(deadline_label(now(), now()), "Due today!");
        assert_eq!(deadline_label(now() + Duration::days(1), now()), "Due tomorrow");
        assert_eq!(deadline_label(now() + Duration::days(4), now()), "Due in 4 days");
    }
}
