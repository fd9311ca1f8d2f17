//! Core domain types for the Celestial Pulse tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Movement and skill keys and their step ladders
//! - Workout logs (strength, skill hold, cardio)
//! - Per-user progress state
//! - User profiles and their listing summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Keys
// ============================================================================

/// One of the six strength progressions
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementKey {
    Pushup,
    Squat,
    Pullup,
    Legraise,
    Bridge,
    Handstand,
}

impl MovementKey {
    pub const ALL: [MovementKey; 6] = [
        MovementKey::Pushup,
        MovementKey::Squat,
        MovementKey::Pullup,
        MovementKey::Legraise,
        MovementKey::Bridge,
        MovementKey::Handstand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKey::Pushup => "pushup",
            MovementKey::Squat => "squat",
            MovementKey::Pullup => "pullup",
            MovementKey::Legraise => "legraise",
            MovementKey::Bridge => "bridge",
            MovementKey::Handstand => "handstand",
        }
    }
}

/// One of the isometric skill holds
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkillKey {
    HandstandHold,
    Lsit,
    HollowHold,
    ArchHold,
    FrontLever,
    BackLever,
    FrogStand,
    RingSupport,
}

impl SkillKey {
    pub const ALL: [SkillKey; 8] = [
        SkillKey::HandstandHold,
        SkillKey::Lsit,
        SkillKey::HollowHold,
        SkillKey::ArchHold,
        SkillKey::FrontLever,
        SkillKey::BackLever,
        SkillKey::FrogStand,
        SkillKey::RingSupport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillKey::HandstandHold => "handstand_hold",
            SkillKey::Lsit => "lsit",
            SkillKey::HollowHold => "hollow_hold",
            SkillKey::ArchHold => "arch_hold",
            SkillKey::FrontLever => "front_lever",
            SkillKey::BackLever => "back_lever",
            SkillKey::FrogStand => "frog_stand",
            SkillKey::RingSupport => "ring_support",
        }
    }
}

impl fmt::Display for MovementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SkillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let wanted = s.trim().to_lowercase();
        MovementKey::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| crate::Error::Validation(format!("Unknown movement: {}", s)))
    }
}

impl FromStr for SkillKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let wanted = s.trim().to_lowercase();
        SkillKey::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| crate::Error::Validation(format!("Unknown skill: {}", s)))
    }
}

/// Either ladder a user can move up or down
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressionKey {
    Movement(MovementKey),
    Skill(SkillKey),
}

impl fmt::Display for ProgressionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressionKey::Movement(k) => k.fmt(f),
            ProgressionKey::Skill(k) => k.fmt(f),
        }
    }
}

impl FromStr for ProgressionKey {
    type Err = crate::Error;

    /// Movement and skill keys are disjoint, so a bare key is unambiguous.
    fn from_str(s: &str) -> crate::Result<Self> {
        if let Ok(k) = s.parse::<MovementKey>() {
            return Ok(ProgressionKey::Movement(k));
        }
        if let Ok(k) = s.parse::<SkillKey>() {
            return Ok(ProgressionKey::Skill(k));
        }
        Err(crate::Error::Validation(format!(
            "Unknown movement or skill: {}",
            s
        )))
    }
}

/// Which way to move along a ladder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

// ============================================================================
// Catalog Types
// ============================================================================

/// One rung of a progression ladder
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub id: String,
    pub label: String,
    /// Base difficulty weight
    pub xp: u32,
}

/// A strength progression (e.g. "Pushup", wall pushup to one-arm pushup)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub key: MovementKey,
    pub name: String,
    pub steps: Vec<Step>,
    pub target_per_week: u32,
}

/// An isometric skill hold ladder
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Skill {
    pub key: SkillKey,
    pub name: String,
    pub steps: Vec<Step>,
}

/// The complete catalog of movements and skills, in display order
#[derive(Clone, Debug)]
pub struct Catalog {
    pub movements: Vec<Movement>,
    pub skills: Vec<Skill>,
}

// ============================================================================
// Logs and Progress
// ============================================================================

/// A recorded workout. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutLog {
    #[serde(rename_all = "camelCase")]
    Movement {
        id: String,
        date: DateTime<Utc>,
        key: MovementKey,
        step_index: usize,
        #[serde(deserialize_with = "count_at_least_one")]
        sets: u32,
        #[serde(deserialize_with = "count_at_least_one")]
        reps: u32,
        xp_awarded: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Skill {
        id: String,
        date: DateTime<Utc>,
        key: SkillKey,
        step_index: usize,
        xp_awarded: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Cardio {
        id: String,
        date: DateTime<Utc>,
        #[serde(deserialize_with = "minutes_at_least_one")]
        minutes: u32,
        xp_awarded: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
}

// Older documents stored raw form input, so counts may be zero, negative or
// fractional. They are coerced the same way new logs are.
fn count_at_least_one<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    i64::deserialize(deserializer).map(crate::xp::clamp_count)
}

fn minutes_at_least_one<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(crate::xp::clamp_minutes)
}

impl WorkoutLog {
    pub fn id(&self) -> &str {
        match self {
            WorkoutLog::Movement { id, .. }
            | WorkoutLog::Skill { id, .. }
            | WorkoutLog::Cardio { id, .. } => id,
        }
    }

    pub fn date(&self) -> DateTime<Utc> {
        match self {
            WorkoutLog::Movement { date, .. }
            | WorkoutLog::Skill { date, .. }
            | WorkoutLog::Cardio { date, .. } => *date,
        }
    }

    pub fn xp_awarded(&self) -> u64 {
        match self {
            WorkoutLog::Movement { xp_awarded, .. }
            | WorkoutLog::Skill { xp_awarded, .. }
            | WorkoutLog::Cardio { xp_awarded, .. } => *xp_awarded,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        match self {
            WorkoutLog::Movement { notes, .. }
            | WorkoutLog::Skill { notes, .. }
            | WorkoutLog::Cardio { notes, .. } => notes.as_deref(),
        }
    }

    /// The `type` tag as it appears in documents
    pub fn kind(&self) -> &'static str {
        match self {
            WorkoutLog::Movement { .. } => "movement",
            WorkoutLog::Skill { .. } => "skill",
            WorkoutLog::Cardio { .. } => "cardio",
        }
    }
}

/// A user's mutable progress document
///
/// `xp` always equals the sum of `xp_awarded` over `logs`; only a reset or an
/// import replaces it wholesale.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub current_step_by_movement: BTreeMap<MovementKey, usize>,
    pub current_step_by_skill: BTreeMap<SkillKey, usize>,
    /// Most recent first, by insertion
    pub logs: Vec<WorkoutLog>,
    pub xp: u64,
}

// ============================================================================
// Users
// ============================================================================

/// A local profile owning one progress document
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub progress_state: ProgressState,
}

/// Read-only listing projection of a user. Never persisted.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub last_active_at: DateTime<Utc>,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub level: u64,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            last_active_at: user.last_active_at,
            total_xp: user.progress_state.xp,
            level: crate::xp::level_for_xp(user.progress_state.xp),
        }
    }
}
