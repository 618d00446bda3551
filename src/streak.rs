//! Consecutive-day activity streaks, kept on the client only.
//!
//! Streaks are never sent to the server, so two devices belonging to the
//! same user keep two independent streaks.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::storage::LocalStorage;

pub const STREAK_STORAGE_KEY: &str = "learningStreak";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
    pub last_active: Option<NaiveDate>,
    pub days_active: Vec<NaiveDate>,
}

impl Streak {
    /// Records activity on `today`.
    ///
    /// Returns `false` and leaves the streak untouched if `today` was
    /// already recorded.
    pub fn record_activity(&mut self, today: NaiveDate) -> bool {
        if self.days_active.contains(&today) {
            return false;
        }

        self.current = match self.last_active.map(|last| (today - last).num_days()) {
            None => 1,
            Some(1) => self.current + 1,
            Some(gap) if gap > 1 => 1,
            // Same day, or the clock moved backwards
            Some(_) => self.current.max(1),
        };

        // A backwards clock never rewinds the streak's anchor
        self.last_active = self.last_active.max(Some(today));
        self.days_active.push(today);
        self.longest = self.longest.max(self.current);

        true
    }
}

impl std::fmt::Display for Streak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Streak: {} day{} (longest {})",
            self.current,
            if self.current == 1 { "" } else { "s" },
            self.longest
        )
    }
}

/// Local calendar date of a millisecond timestamp.
pub fn activity_date(timestamp_millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(timestamp_millis)
        .map(|instant| instant.with_timezone(&Local).date_naive())
}

/// Loads, updates and stores the streak kept in local storage.
pub struct StreakTracker {
    storage: LocalStorage,
}

impl StreakTracker {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Reads the stored streak. Missing or unreadable entries start over.
    pub fn load(&self) -> Result<Streak> {
        let Some(raw) = self.storage.get_item(STREAK_STORAGE_KEY)? else {
            return Ok(Streak::default());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            log::warn!("[StreakTracker::load] Discarding unreadable streak: {err}");
            Streak::default()
        }))
    }

    /// Applies one observation of the user's state on `today` and persists
    /// the result if it changed.
    pub fn observe(&self, today: NaiveDate, active_today: bool) -> Result<Streak> {
        let mut streak = self.load()?;

        if active_today && streak.record_activity(today) {
            log::debug!("[StreakTracker::observe] Streak is now {}", streak.current);
            self.storage
                .set_item(STREAK_STORAGE_KEY, &serde_json::to_string(&streak)?)?;
        }

        Ok(streak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn first_activity_starts_a_streak() {
        let mut streak = Streak::default();
        assert!(streak.record_activity(day(1)));
        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 1);
        assert_eq!(streak.last_active, Some(day(1)));
    }

    #[test]
    fn consecutive_day_extends_by_one() {
        let mut streak = Streak::default();
        streak.record_activity(day(1));
        streak.record_activity(day(2));
        streak.record_activity(day(3));
        assert_eq!(streak.current, 3);
        assert_eq!(streak.days_active, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn same_day_is_a_no_op() {
        let mut streak = Streak::default();
        streak.record_activity(day(4));
        let before = streak.clone();

        assert!(!streak.record_activity(day(4)));
        assert_eq!(streak, before);
    }

    #[test]
    fn gap_resets_but_keeps_longest() {
        let mut streak = Streak::default();
        for d in 1..=4 {
            streak.record_activity(day(d));
        }
        streak.record_activity(day(9));

        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 4);
    }

    #[test]
    fn longest_is_never_below_current() {
        let mut streak = Streak::default();
        for d in [1, 2, 5, 6, 7, 8, 20, 21] {
            streak.record_activity(day(d));
            assert!(streak.longest >= streak.current);
        }
        assert_eq!(streak.longest, 4);
    }

    #[test]
    fn earlier_day_does_not_move_last_active_back() {
        let mut streak = Streak::default();
        streak.record_activity(day(5));
        streak.record_activity(day(6));

        assert!(streak.record_activity(day(3)));
        assert_eq!(streak.current, 2);
        assert_eq!(streak.last_active, Some(day(6)));
        assert!(streak.days_active.contains(&day(3)));

        streak.record_activity(day(7));
        assert_eq!(streak.current, 3);
    }

    #[test]
    fn stored_format_uses_client_keys() {
        let mut streak = Streak::default();
        streak.record_activity(day(2));
        let json = serde_json::to_value(&streak).unwrap();

        assert_eq!(json["lastActive"], "2026-03-02");
        assert_eq!(json["daysActive"][0], "2026-03-02");
    }

    #[test]
    fn tracker_persists_only_active_days() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = StreakTracker::new(LocalStorage::open(dir.path()).unwrap());

        let idle = tracker.observe(day(1), false).unwrap();
        assert_eq!(idle, Streak::default());

        tracker.observe(day(1), true).unwrap();
        let streak = tracker.observe(day(2), true).unwrap();
        assert_eq!(streak.current, 2);

        let reloaded = StreakTracker::new(LocalStorage::open(dir.path()).unwrap())
            .load()
            .unwrap();
        assert_eq!(reloaded, streak);
    }

    #[test]
    fn tracker_survives_clock_moving_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = StreakTracker::new(LocalStorage::open(dir.path()).unwrap());

        tracker.observe(day(10), true).unwrap();
        tracker.observe(day(11), true).unwrap();
        let rewound = tracker.observe(day(8), true).unwrap();
        assert_eq!(rewound.current, 2);
        assert_eq!(rewound.last_active, Some(day(11)));

        let resumed = tracker.observe(day(12), true).unwrap();
        assert_eq!(resumed.current, 3);
        assert_eq!(resumed.longest, 3);
    }

    #[test]
    fn corrupt_entry_starts_over() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).unwrap();
        storage.set_item(STREAK_STORAGE_KEY, "not json").unwrap();

        let streak = StreakTracker::new(storage).load().unwrap();
        assert_eq!(streak, Streak::default());
    }
}
