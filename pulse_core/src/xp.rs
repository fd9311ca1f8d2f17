//! Experience point formulas.
//!
//! All inputs are coerced rather than rejected: a set, rep or minute count
//! below one counts as one. That leniency is part of the public contract, so
//! none of these functions can fail.

use crate::Step;

/// XP needed per level
pub const XP_PER_LEVEL: u64 = 100;

/// `step.xp * sets * reps`, with sets and reps clamped to at least 1
pub fn strength_xp(step: &Step, sets: i64, reps: i64) -> u64 {
    let sets = clamp_count(sets) as u64;
    let reps = clamp_count(reps) as u64;
    u64::from(step.xp).saturating_mul(sets).saturating_mul(reps)
}

/// A hold is worth its difficulty tier, however long it was held.
pub fn skill_xp(step: &Step) -> u64 {
    u64::from(step.xp)
}

/// One XP per whole minute, minimum one.
pub fn cardio_xp(minutes: f64) -> u64 {
    u64::from(clamp_minutes(minutes))
}

/// `floor(xp / 100) + 1`
pub fn level_for_xp(xp: u64) -> u64 {
    xp / XP_PER_LEVEL + 1
}

/// XP still needed to reach the next level
pub fn xp_to_next_level(xp: u64) -> u64 {
    XP_PER_LEVEL - xp % XP_PER_LEVEL
}

/// Clamp a set or rep count into `[1, u32::MAX]`
pub fn clamp_count(n: i64) -> u32 {
    u32::try_from(n.max(1)).unwrap_or(u32::MAX)
}

/// Whole minutes, at least one. NaN counts as one.
pub fn clamp_minutes(minutes: f64) -> u32 {
    let floored = minutes.floor();
    if floored.is_nan() || floored < 1.0 {
        1
    } else if floored >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        floored as u32
    }
}
