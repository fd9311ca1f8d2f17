//! Progress state machine.
//!
//! Every change to a user's step positions, log history and XP total goes
//! through the operations here:
//! - Step ladders move one rung at a time and clamp at both ends
//! - Logging reads the current step, awards XP and prepends an entry
//! - Reset replaces everything with the catalog's starting positions

use crate::catalog::{DEFAULT_MOVEMENT_STEPS, DEFAULT_SKILL_STEPS};
use crate::{
    xp, Catalog, Direction, Error, MovementKey, ProgressState, ProgressionKey, Result, SkillKey,
    Step, WorkoutLog,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            current_step_by_movement: DEFAULT_MOVEMENT_STEPS.into_iter().collect(),
            current_step_by_skill: DEFAULT_SKILL_STEPS.into_iter().collect(),
            logs: Vec::new(),
            xp: 0,
        }
    }
}

fn new_log_id() -> String {
    Uuid::new_v4().to_string()
}

fn clean_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

impl ProgressState {
    /// Current step index for a movement or skill (0 if never set)
    pub fn current_index(&self, key: ProgressionKey) -> usize {
        match key {
            ProgressionKey::Movement(k) => {
                self.current_step_by_movement.get(&k).copied().unwrap_or(0)
            }
            ProgressionKey::Skill(k) => self.current_step_by_skill.get(&k).copied().unwrap_or(0),
        }
    }

    /// The catalog step the user is currently working
    pub fn current_step<'c>(&self, catalog: &'c Catalog, key: ProgressionKey) -> Result<&'c Step> {
        let index = self.current_index(key);
        catalog.step_at(key, index).ok_or_else(|| {
            Error::State(format!("Step {} is out of range for '{}'", index, key))
        })
    }

    /// Move one rung up or down a ladder, clamping at both ends
    ///
    /// Returns the resulting index. Never errors and never wraps; an unknown
    /// key or an empty ladder leaves the state as it was.
    pub fn advance_step(
        &mut self,
        catalog: &Catalog,
        key: ProgressionKey,
        direction: Direction,
    ) -> usize {
        let current = self.current_index(key);
        let len = catalog.steps(key).map(|s| s.len()).unwrap_or(0);
        if len == 0 {
            tracing::warn!("No steps in catalog for '{}', leaving index at {}", key, current);
            return current;
        }

        let max = len - 1;
        let next = match direction {
            Direction::Up => current.saturating_add(1).min(max),
            Direction::Down => current.saturating_sub(1).min(max),
        };

        match key {
            ProgressionKey::Movement(k) => {
                self.current_step_by_movement.insert(k, next);
            }
            ProgressionKey::Skill(k) => {
                self.current_step_by_skill.insert(k, next);
            }
        }

        if next == current {
            tracing::debug!("'{}' already at boundary step {}", key, current);
        } else {
            tracing::debug!("'{}' moved from step {} to {}", key, current, next);
        }
        next
    }

    /// Log a strength session at the movement's current step
    pub fn log_movement(
        &mut self,
        catalog: &Catalog,
        key: MovementKey,
        sets: i64,
        reps: i64,
        notes: Option<&str>,
    ) -> Result<WorkoutLog> {
        self.log_movement_at(catalog, key, sets, reps, notes, Utc::now())
    }

    pub fn log_movement_at(
        &mut self,
        catalog: &Catalog,
        key: MovementKey,
        sets: i64,
        reps: i64,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<WorkoutLog> {
        let pkey = ProgressionKey::Movement(key);
        let step_index = self.current_index(pkey);
        let step = self.current_step(catalog, pkey)?;
        let xp_awarded = xp::strength_xp(step, sets, reps);

        let entry = WorkoutLog::Movement {
            id: new_log_id(),
            date: at,
            key,
            step_index,
            sets: xp::clamp_count(sets),
            reps: xp::clamp_count(reps),
            xp_awarded,
            notes: clean_notes(notes),
        };

        tracing::info!(
            "Logged {} at step {} ({}): +{} xp",
            key,
            step_index + 1,
            step.label,
            xp_awarded
        );
        Ok(self.push_log(entry))
    }

    /// Log a skill hold at the skill's current step
    pub fn log_skill(
        &mut self,
        catalog: &Catalog,
        key: SkillKey,
        notes: Option<&str>,
    ) -> Result<WorkoutLog> {
        self.log_skill_at(catalog, key, notes, Utc::now())
    }

    pub fn log_skill_at(
        &mut self,
        catalog: &Catalog,
        key: SkillKey,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<WorkoutLog> {
        let pkey = ProgressionKey::Skill(key);
        let step_index = self.current_index(pkey);
        let step = self.current_step(catalog, pkey)?;
        let xp_awarded = xp::skill_xp(step);

        let entry = WorkoutLog::Skill {
            id: new_log_id(),
            date: at,
            key,
            step_index,
            xp_awarded,
            notes: clean_notes(notes),
        };

        tracing::info!("Logged {} hold ({}): +{} xp", key, step.label, xp_awarded);
        Ok(self.push_log(entry))
    }

    /// Log a cardio session; minutes are floored and clamped to at least 1
    pub fn log_cardio(&mut self, minutes: f64, notes: Option<&str>) -> WorkoutLog {
        self.log_cardio_at(minutes, notes, Utc::now())
    }

    pub fn log_cardio_at(
        &mut self,
        minutes: f64,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> WorkoutLog {
        let minutes = xp::clamp_minutes(minutes);
        let xp_awarded = xp::cardio_xp(f64::from(minutes));

        let entry = WorkoutLog::Cardio {
            id: new_log_id(),
            date: at,
            minutes,
            xp_awarded,
            notes: clean_notes(notes),
        };

        tracing::info!("Logged {} min cardio: +{} xp", minutes, xp_awarded);
        self.push_log(entry)
    }

    fn push_log(&mut self, entry: WorkoutLog) -> WorkoutLog {
        self.xp = self.xp.saturating_add(entry.xp_awarded());
        self.logs.insert(0, entry.clone());
        entry
    }

    /// Discard all progress and return to the starting step positions
    pub fn reset_all(&mut self) {
        tracing::info!(
            "Resetting progress ({} logs, {} xp discarded)",
            self.logs.len(),
            self.xp
        );
        *self = Self::default();
    }

    /// The `n` most recently inserted logs
    pub fn recent_logs(&self, n: usize) -> &[WorkoutLog] {
        &self.logs[..n.min(self.logs.len())]
    }

    pub fn level(&self) -> u64 {
        xp::level_for_xp(self.xp)
    }

    /// Sum of `xp_awarded` over every log
    pub fn logged_xp(&self) -> u64 {
        self.logs
            .iter()
            .fold(0u64, |acc, l| acc.saturating_add(l.xp_awarded()))
    }

    /// Check the state against the catalog
    ///
    /// Returns a list of problems, or empty Vec if consistent.
    pub fn validate(&self, catalog: &Catalog) -> Vec<String> {
        let mut errors = Vec::new();

        for key in MovementKey::ALL {
            match self.current_step_by_movement.get(&key) {
                None => errors.push(format!("Missing step index for movement '{}'", key)),
                Some(&i) if catalog.step_at(ProgressionKey::Movement(key), i).is_none() => {
                    errors.push(format!("Step index {} out of range for movement '{}'", i, key))
                }
                Some(_) => {}
            }
        }
        for key in SkillKey::ALL {
            match self.current_step_by_skill.get(&key) {
                None => errors.push(format!("Missing step index for skill '{}'", key)),
                Some(&i) if catalog.step_at(ProgressionKey::Skill(key), i).is_none() => {
                    errors.push(format!("Step index {} out of range for skill '{}'", i, key))
                }
                Some(_) => {}
            }
        }

        for log in &self.logs {
            let out_of_range = match log {
                WorkoutLog::Movement {
                    key, step_index, ..
                } => catalog
                    .step_at(ProgressionKey::Movement(*key), *step_index)
                    .is_none(),
                WorkoutLog::Skill {
                    key, step_index, ..
                } => catalog
                    .step_at(ProgressionKey::Skill(*key), *step_index)
                    .is_none(),
                WorkoutLog::Cardio { .. } => false,
            };
            if out_of_range {
                errors.push(format!("Log {} refers to a step outside its ladder", log.id()));
            }
            let zero_count = match log {
                WorkoutLog::Movement { sets, reps, .. } => *sets == 0 || *reps == 0,
                WorkoutLog::Cardio { minutes, .. } => *minutes == 0,
                WorkoutLog::Skill { .. } => false,
            };
            if zero_count {
                errors.push(format!("Log {} has a zero count", log.id()));
            }
        }

        let logged = self.logged_xp();
        if logged != self.xp {
            errors.push(format!(
                "XP total {} does not match the {} xp awarded by its logs",
                self.xp, logged
            ));
        }

        errors
    }
}
