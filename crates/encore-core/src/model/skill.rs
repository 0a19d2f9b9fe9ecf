use crate::model::{MAX_DECK_SIZE, Unit};
use serde::{Deserialize, Serialize};

/// Parameters of a reference skill: it absorbs `rate`% of another member's
/// own skill value, up to `max` extra points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceParams {
    pub rate: f64,
    pub max: f64,
}

/// Pre-training alternative reachable before the card is trained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreTrainingSkill {
    pub skill_id: u32,
    pub life_recovery: u32,
    pub kind: PreTrainingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreTrainingKind {
    /// Fixed value plus a capped share of another member's skill.
    Reference { score_up: f64, rate: f64, max: f64 },
    /// Fixed value plus a bonus per distinct deck unit beyond the card's own.
    DifferentUnit { score_up: f64, per_extra_unit: f64 },
}

/// A resolved skill candidate for one deck slot. `score_up_to_reference` is
/// the value other members see when they reference this slot; reference
/// slots expose their inflated optimistic value until the enumeration pass
/// settles them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillPrepare {
    pub skill_id: u32,
    pub is_after_training: bool,
    pub score_up_fixed: f64,
    pub score_up_to_reference: f64,
    pub life_recovery: u32,
    pub reference: Option<ReferenceParams>,
}

impl SkillPrepare {
    pub const fn zero() -> Self {
        Self {
            skill_id: 0,
            is_after_training: false,
            score_up_fixed: 0.0,
            score_up_to_reference: 0.0,
            life_recovery: 0,
            reference: None,
        }
    }
}

/// Unit-scaled component of a post-training skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitScaling {
    pub unit: Unit,
    pub per_member: f64,
}

/// Skill capability of one card. The post-training state is always
/// available; a pre-training alternative may exist and is resolved by the
/// deck calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardSkill {
    pub skill_id: u32,
    /// Fixed score-up of the post-training skill.
    pub score_up: f64,
    /// Extra score-up per additional same-unit member, if the skill scales.
    pub unit_scaling: Option<UnitScaling>,
    pub life_recovery: u32,
    pub pre_training: Option<PreTrainingSkill>,
}

impl CardSkill {
    pub const fn fixed(skill_id: u32, score_up: f64) -> Self {
        Self {
            skill_id,
            score_up,
            unit_scaling: None,
            life_recovery: 0,
            pre_training: None,
        }
    }

    pub const fn has_pre_training(&self) -> bool {
        self.pre_training.is_some()
    }

    /// Post-training value when `unit_count` deck members (including this
    /// card) share the queried unit.
    pub fn prepare(&self, unit: Unit, unit_count: usize) -> SkillPrepare {
        let mut score = self.score_up;
        if let Some(scaling) = self.unit_scaling {
            if scaling.unit == unit && unit_count > 0 {
                score += scaling.per_member * (unit_count - 1) as f64;
            }
        }
        SkillPrepare {
            skill_id: self.skill_id,
            is_after_training: true,
            score_up_fixed: score,
            score_up_to_reference: score,
            life_recovery: self.life_recovery,
            reference: None,
        }
    }

    /// Pre-training reference candidate at its optimistic (capped) value.
    pub fn reference_candidate(&self) -> Option<SkillPrepare> {
        let pre = self.pre_training?;
        match pre.kind {
            PreTrainingKind::Reference { score_up, rate, max } => {
                let inflated = score_up + max;
                Some(SkillPrepare {
                    skill_id: pre.skill_id,
                    is_after_training: false,
                    score_up_fixed: inflated,
                    score_up_to_reference: inflated,
                    life_recovery: pre.life_recovery,
                    reference: Some(ReferenceParams { rate, max }),
                })
            }
            PreTrainingKind::DifferentUnit { .. } => None,
        }
    }

    /// Pre-training different-unit candidate for a deck holding
    /// `extra_units` distinct units beyond this card's own.
    pub fn different_unit_candidate(&self, extra_units: usize) -> Option<SkillPrepare> {
        let pre = self.pre_training?;
        match pre.kind {
            PreTrainingKind::DifferentUnit {
                score_up,
                per_extra_unit,
            } => Some(SkillPrepare {
                skill_id: pre.skill_id,
                is_after_training: false,
                score_up_fixed: score_up + per_extra_unit * extra_units as f64,
                score_up_to_reference: score_up + per_extra_unit * extra_units as f64,
                life_recovery: pre.life_recovery,
                reference: None,
            }),
            PreTrainingKind::Reference { .. } => None,
        }
    }

    /// Highest score-up this card can realize in any deck.
    pub fn upper_bound(&self) -> f64 {
        let mut best = self.score_up;
        if let Some(scaling) = self.unit_scaling {
            best += scaling.per_member.max(0.0) * (MAX_DECK_SIZE - 1) as f64;
        }
        if let Some(pre) = self.pre_training {
            let pre_max = match pre.kind {
                PreTrainingKind::Reference { score_up, max, .. } => score_up + max,
                PreTrainingKind::DifferentUnit {
                    score_up,
                    per_extra_unit,
                } => score_up + per_extra_unit.max(0.0) * (MAX_DECK_SIZE - 1) as f64,
            };
            best = best.max(pre_max);
        }
        best
    }

    /// Lowest score-up this card can realize in any deck, across every
    /// training state the calculator may pick.
    pub fn lower_bound(&self) -> f64 {
        let mut worst = self.score_up;
        if let Some(pre) = self.pre_training {
            let pre_min = match pre.kind {
                PreTrainingKind::Reference { score_up, .. } => score_up,
                PreTrainingKind::DifferentUnit { score_up, .. } => score_up,
            };
            worst = worst.min(pre_min);
        }
        worst
    }

    /// Strict interval comparison: true only when this card's skill is
    /// weaker than `other`'s in every possible deck composition.
    pub fn is_certainly_weaker_than(&self, other: &CardSkill) -> bool {
        self.upper_bound() < other.lower_bound()
    }
}
