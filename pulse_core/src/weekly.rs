//! Weekly rollups over a user's log.
//!
//! Weeks start Monday 00:00 local time and run to the following Monday,
//! exclusive. The window is derived from "now" at query time and never
//! stored.

use crate::{Catalog, MovementKey, ProgressState, WorkoutLog};
use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc,
};
use std::collections::BTreeMap;

/// Skill sessions per week
pub const SKILL_WEEKLY_TARGET: u32 = 3;

/// Cardio minutes per week
pub const CARDIO_WEEKLY_TARGET: u32 = 120;

/// Half-open `[start, end)` window covering one Monday-start week
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl WeekWindow {
    /// The week containing `now`
    pub fn containing(now: DateTime<Local>) -> Self {
        let today = now.date_naive();
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let next_monday = monday + Duration::days(7);

        WeekWindow {
            start: local_midnight(monday),
            end: local_midnight(next_monday),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let at = at.with_timezone(&Local);
        at >= self.start && at < self.end
    }
}

/// Start of `date` in local time
///
/// Where a DST jump skips midnight, the first instant that exists is used.
fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    let mut naive = date.and_time(NaiveTime::MIN);
    for _ in 0..4 {
        match Local.from_local_datetime(&naive) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => naive += Duration::minutes(30),
        }
    }
    Local.from_utc_datetime(&naive)
}

/// Week-scoped progress toward the fixed weekly targets
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeeklyStats {
    pub window: WeekWindow,
    /// Exposures per movement this week (every movement present, zero if none)
    pub weekly_strength_counts: BTreeMap<MovementKey, u32>,
    pub strength_total_targets: u32,
    pub strength_done: u32,
    pub strength_pct: u32,
    pub weekly_skill_sessions: u32,
    pub skill_pct: u32,
    pub weekly_cardio_minutes: u32,
    pub cardio_pct: u32,
}

impl WeeklyStats {
    /// Rollups for the current week
    pub fn compute(state: &ProgressState, catalog: &Catalog) -> Self {
        Self::compute_at(state, catalog, Local::now())
    }

    /// Rollups for the week containing `now`
    pub fn compute_at(state: &ProgressState, catalog: &Catalog, now: DateTime<Local>) -> Self {
        let window = WeekWindow::containing(now);

        let mut weekly_strength_counts: BTreeMap<MovementKey, u32> =
            MovementKey::ALL.into_iter().map(|k| (k, 0)).collect();
        let mut weekly_skill_sessions = 0u32;
        let mut weekly_cardio_minutes = 0u32;

        for log in state.logs.iter().filter(|l| window.contains(l.date())) {
            match log {
                WorkoutLog::Movement { key, .. } => {
                    *weekly_strength_counts.entry(*key).or_insert(0) += 1;
                }
                WorkoutLog::Skill { .. } => weekly_skill_sessions += 1,
                WorkoutLog::Cardio { minutes, .. } => {
                    weekly_cardio_minutes = weekly_cardio_minutes.saturating_add(*minutes);
                }
            }
        }

        let strength_total_targets = catalog.strength_total_targets();
        let strength_done = weekly_strength_counts.values().sum();

        let stats = WeeklyStats {
            window,
            strength_pct: percent(strength_done, strength_total_targets),
            skill_pct: percent(weekly_skill_sessions, SKILL_WEEKLY_TARGET),
            cardio_pct: percent(weekly_cardio_minutes, CARDIO_WEEKLY_TARGET),
            weekly_strength_counts,
            strength_total_targets,
            strength_done,
            weekly_skill_sessions,
            weekly_cardio_minutes,
        };

        tracing::debug!(
            "Weekly stats from {}: strength {}/{}, skill {}, cardio {} min",
            stats.window.start,
            stats.strength_done,
            stats.strength_total_targets,
            stats.weekly_skill_sessions,
            stats.weekly_cardio_minutes
        );
        stats
    }

    pub fn strength_count(&self, key: MovementKey) -> u32 {
        self.weekly_strength_counts.get(&key).copied().unwrap_or(0)
    }
}

/// `min(100, round(100 * done / target))`; a zero target counts as complete
fn percent(done: u32, target: u32) -> u32 {
    if target == 0 {
        return 100;
    }
    let pct = (f64::from(done) * 100.0 / f64::from(target)).round();
    (pct as u32).min(100)
}
