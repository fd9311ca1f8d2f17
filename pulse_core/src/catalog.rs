//! Default catalog of movements and skill holds.
//!
//! Six strength progressions of ten steps each plus eight isometric skill
//! ladders. Every step carries a base difficulty weight used by the XP
//! calculator.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Weekly exposure target shared by every built-in movement
const MOVEMENT_TARGET_PER_WEEK: u32 = 2;

/// Starting step index for each movement in a fresh progress state
pub const DEFAULT_MOVEMENT_STEPS: [(MovementKey, usize); 6] = [
    (MovementKey::Pushup, 4),
    (MovementKey::Squat, 4),
    (MovementKey::Pullup, 3),
    (MovementKey::Legraise, 2),
    (MovementKey::Bridge, 2),
    (MovementKey::Handstand, 2),
];

/// Starting step index for each skill in a fresh progress state
pub const DEFAULT_SKILL_STEPS: [(SkillKey, usize); 8] = [
    (SkillKey::HandstandHold, 1),
    (SkillKey::Lsit, 1),
    (SkillKey::HollowHold, 1),
    (SkillKey::ArchHold, 0),
    (SkillKey::FrontLever, 0),
    (SkillKey::BackLever, 0),
    (SkillKey::FrogStand, 0),
    (SkillKey::RingSupport, 0),
];

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn step(id: &str, label: &str, xp: u32) -> Step {
    Step {
        id: id.into(),
        label: label.into(),
        xp,
    }
}

fn movement(key: MovementKey, name: &str, steps: Vec<Step>) -> Movement {
    Movement {
        key,
        name: name.into(),
        steps,
        target_per_week: MOVEMENT_TARGET_PER_WEEK,
    }
}

fn skill(key: SkillKey, name: &str, steps: Vec<Step>) -> Skill {
    Skill {
        key,
        name: name.into(),
        steps,
    }
}

/// Builds the default catalog
///
/// Prefer `get_default_catalog()`; this is retained for tests and custom
/// catalogs.
pub fn build_default_catalog() -> Catalog {
    let movements = vec![
        movement(
            MovementKey::Pushup,
            "Pushup",
            vec![
                step("P1", "Wall pushup", 5),
                step("P2", "Incline pushup", 6),
                step("P3", "Knee pushup", 7),
                step("P4", "Half pushup", 8),
                step("P5", "Full pushup", 10),
                step("P6", "Close pushup", 11),
                step("P7", "Uneven pushup", 12),
                step("P8", "Half one-arm pushup", 14),
                step("P9", "Assisted one-arm pushup", 16),
                step("P10", "One-arm pushup", 20),
            ],
        ),
        movement(
            MovementKey::Squat,
            "Squat",
            vec![
                step("S1", "Shoulder stand squat", 5),
                step("S2", "Jackknife squat", 6),
                step("S3", "Supported squat", 7),
                step("S4", "Half squat", 8),
                step("S5", "Full squat", 10),
                step("S6", "Close squat", 11),
                step("S7", "Uneven squat", 12),
                step("S8", "Half one-leg squat", 14),
                step("S9", "Assisted pistol squat", 16),
                step("S10", "Pistol squat", 20),
            ],
        ),
        movement(
            MovementKey::Pullup,
            "Pullup",
            vec![
                step("U1", "Vertical pull", 5),
                step("U2", "Horizontal pull", 6),
                step("U3", "Jackknife pull", 7),
                step("U4", "Half pullup", 8),
                step("U5", "Full pullup", 10),
                step("U6", "Close pullup", 11),
                step("U7", "Uneven pullup", 12),
                step("U8", "Half one-arm pull", 14),
                step("U9", "Assisted one-arm pullup", 16),
                step("U10", "One-arm pullup", 20),
            ],
        ),
        movement(
            MovementKey::Legraise,
            "Leg raise",
            vec![
                step("L1", "Knee tucks lying", 5),
                step("L2", "Flat knee raise", 6),
                step("L3", "Flat straight leg raise", 7),
                step("L4", "Hanging knee raise", 8),
                step("L5", "Hanging bent leg raise", 10),
                step("L6", "Hanging straight leg raise", 12),
                step("L7", "Hanging L raise", 14),
                step("L8", "Hanging L hold", 15),
                step("L9", "Hanging V raise", 18),
                step("L10", "Strict V raise", 20),
            ],
        ),
        movement(
            MovementKey::Bridge,
            "Bridge",
            vec![
                step("B1", "Short bridge", 5),
                step("B2", "Straight bridge", 6),
                step("B3", "Angled bridge", 7),
                step("B4", "Head bridge", 8),
                step("B5", "Half bridge", 10),
                step("B6", "Full bridge", 12),
                step("B7", "Close bridge", 14),
                step("B8", "Uneven bridge", 16),
                step("B9", "Wall walk down", 18),
                step("B10", "Stand to bridge and back", 22),
            ],
        ),
        movement(
            MovementKey::Handstand,
            "Handstand pushup",
            vec![
                step("H1", "Wall headstand", 5),
                step("H2", "Crow stand", 6),
                step("H3", "Wall handstand", 7),
                step("H4", "Short range HSPU", 8),
                step("H5", "Half HSPU", 10),
                step("H6", "Full HSPU", 12),
                step("H7", "Close grip HSPU", 14),
                step("H8", "Uneven HSPU", 16),
                step("H9", "Assisted one-arm HSPU", 18),
                step("H10", "One-arm HSPU", 24),
            ],
        ),
    ];

    let skills = vec![
        skill(
            SkillKey::HandstandHold,
            "Handstand hold",
            vec![
                step("HS1", "Wall headstand hold", 6),
                step("HS2", "Wall handstand hold", 8),
                step("HS3", "Chest-to-wall handstand", 10),
                step("HS4", "Freestanding handstand hold", 14),
            ],
        ),
        skill(
            SkillKey::Lsit,
            "L-sit",
            vec![
                step("LS1", "Tuck support hold", 6),
                step("LS2", "One leg out support", 8),
                step("LS3", "Parallel bars L-sit", 12),
                step("LS4", "Advanced L / V progress", 16),
            ],
        ),
        skill(
            SkillKey::HollowHold,
            "Hollow body hold",
            vec![
                step("HB1", "Hollow tuck hold", 5),
                step("HB2", "Hollow body hold", 8),
                step("HB3", "Advanced hollow hold", 12),
            ],
        ),
        skill(
            SkillKey::ArchHold,
            "Arch/Superman hold",
            vec![
                step("AR1", "Superman hold", 5),
                step("AR2", "Superman arms overhead", 7),
                step("AR3", "Arch rock hold", 10),
            ],
        ),
        skill(
            SkillKey::FrontLever,
            "Front lever",
            vec![
                step("FL1", "Tuck front lever", 10),
                step("FL2", "Advanced tuck front lever", 14),
                step("FL3", "Straddle front lever", 18),
                step("FL4", "Full front lever", 24),
            ],
        ),
        skill(
            SkillKey::BackLever,
            "Back lever",
            vec![
                step("BL1", "Tuck back lever", 10),
                step("BL2", "Advanced tuck back lever", 14),
                step("BL3", "Straddle back lever", 18),
                step("BL4", "Full back lever", 24),
            ],
        ),
        skill(
            SkillKey::FrogStand,
            "Frog stand",
            vec![
                step("FR1", "Crow stand hold", 6),
                step("FR2", "Frog stand hold", 8),
                step("FR3", "Frog to handstand taps", 12),
            ],
        ),
        skill(
            SkillKey::RingSupport,
            "Ring support hold",
            vec![
                step("RS1", "Ring support hold (assisted)", 8),
                step("RS2", "Ring support hold", 12),
                step("RS3", "Ring support turned-out", 16),
            ],
        ),
    ];

    Catalog { movements, skills }
}

impl Catalog {
    pub fn movement(&self, key: MovementKey) -> Option<&Movement> {
        self.movements.iter().find(|m| m.key == key)
    }

    pub fn skill(&self, key: SkillKey) -> Option<&Skill> {
        self.skills.iter().find(|s| s.key == key)
    }

    /// The step ladder for a movement or skill
    pub fn steps(&self, key: ProgressionKey) -> Option<&[Step]> {
        match key {
            ProgressionKey::Movement(k) => self.movement(k).map(|m| m.steps.as_slice()),
            ProgressionKey::Skill(k) => self.skill(k).map(|s| s.steps.as_slice()),
        }
    }

    /// Display name for a movement or skill
    pub fn name(&self, key: ProgressionKey) -> Option<&str> {
        match key {
            ProgressionKey::Movement(k) => self.movement(k).map(|m| m.name.as_str()),
            ProgressionKey::Skill(k) => self.skill(k).map(|s| s.name.as_str()),
        }
    }

    pub fn step_at(&self, key: ProgressionKey, index: usize) -> Option<&Step> {
        self.steps(key).and_then(|steps| steps.get(index))
    }

    /// Sum of weekly exposure targets across all movements
    pub fn strength_total_targets(&self) -> u32 {
        self.movements.iter().map(|m| m.target_per_week).sum()
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen_step_ids = HashSet::new();

        for key in MovementKey::ALL {
            if self.movement(key).is_none() {
                errors.push(format!("Catalog has no movement '{}'", key));
            }
        }
        for key in SkillKey::ALL {
            if self.skill(key).is_none() {
                errors.push(format!("Catalog has no skill '{}'", key));
            }
        }

        let ladders = self
            .movements
            .iter()
            .map(|m| (m.key.as_str(), m.name.as_str(), &m.steps))
            .chain(
                self.skills
                    .iter()
                    .map(|s| (s.key.as_str(), s.name.as_str(), &s.steps)),
            );

        for (key, name, steps) in ladders {
            if name.is_empty() {
                errors.push(format!("'{}' has empty name", key));
            }
            if steps.is_empty() {
                errors.push(format!("'{}' has no steps", key));
            }
            for pair in steps.windows(2) {
                if pair[1].xp <= pair[0].xp {
                    errors.push(format!(
                        "'{}': step {} ({} xp) is not harder than {} ({} xp)",
                        key, pair[1].id, pair[1].xp, pair[0].id, pair[0].xp
                    ));
                }
            }
            for step in steps.iter() {
                if step.id.is_empty() || step.label.is_empty() {
                    errors.push(format!("'{}' has a step with empty id or label", key));
                }
                if step.xp == 0 {
                    errors.push(format!("'{}': step {} awards no xp", key, step.id));
                }
                if !seen_step_ids.insert(step.id.as_str()) {
                    errors.push(format!("Duplicate step id '{}'", step.id));
                }
            }
        }

        for (key, index) in DEFAULT_MOVEMENT_STEPS {
            if self.step_at(ProgressionKey::Movement(key), index).is_none() {
                errors.push(format!("Default step {} out of range for '{}'", index, key));
            }
        }
        for (key, index) in DEFAULT_SKILL_STEPS {
            if self.step_at(ProgressionKey::Skill(key), index).is_none() {
                errors.push(format!("Default step {} out of range for '{}'", index, key));
            }
        }

        errors
    }
}

/// Web search link for a step, used as a quick form reference
pub fn reference_url(step: &Step) -> String {
    let query: String = format!("{} exercise", step.label)
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c.to_string(),
            ' ' => "+".to_string(),
            other => {
                let mut buf = [0u8; 4];
                other
                    .encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{:02X}", b))
                    .collect()
            }
        })
        .collect();
    format!("https://www.google.com/search?q={}", query)
}
