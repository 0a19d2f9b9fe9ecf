use crate::deck::detail::{
    DeckCardDetail, DeckCardSkillDetail, DeckDetail, DeckPowerDetail,
};
use crate::model::{
    Attribute, CardDetail, CardPowerDetail, MAX_DECK_SIZE, SkillPrepare, TrainingImage, Unit,
};
use core::fmt;
use serde::{Deserialize, Serialize};

/// How a reference skill picks among the other members' contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillReferenceStrategy {
    Max,
    Min,
    Average,
}

impl Default for SkillReferenceStrategy {
    fn default() -> Self {
        Self::Average
    }
}

/// Bonus granted for fielding a given number of distinct attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeDiversityBonus {
    pub distinct_attributes: usize,
    pub bonus: f64,
}

/// Size of the support deck drawn from the rest of the pool when the event
/// has one.
pub const SUPPORT_DECK_SIZE: usize = 12;

#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    /// Fixed honor bonus added to the deck power total.
    pub honor_bonus: u32,
    /// Count only the highest N per-card event bonuses, when capped.
    pub bonus_card_limit: Option<usize>,
    /// Attribute-diversity bonus table; also enables the support deck.
    pub attribute_diversity_bonuses: Option<Vec<AttributeDiversityBonus>>,
    pub reference_strategy: SkillReferenceStrategy,
    /// Resolve skills at the player's stored training state instead of
    /// enumerating.
    pub keep_training_state: bool,
    /// Move the strongest realized skill to slot 0; disabled when a leader
    /// is pinned by the caller.
    pub best_skill_as_leader: bool,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            honor_bonus: 0,
            bonus_card_limit: None,
            attribute_diversity_bonuses: None,
            reference_strategy: SkillReferenceStrategy::default(),
            keep_training_state: false,
            best_skill_as_leader: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckError {
    InvalidDeckSize(usize),
}

impl fmt::Display for DeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckError::InvalidDeckSize(size) => {
                write!(f, "deck must hold 1 to {MAX_DECK_SIZE} cards, got {size}")
            }
        }
    }
}

impl std::error::Error for DeckError {}

struct MaskOutcome {
    order: Vec<usize>,
    skills: Vec<SkillPrepare>,
    score: f64,
}

pub struct DeckCalculator;

impl DeckCalculator {
    /// Evaluate a concrete deck: power sums, two-state skill resolution,
    /// leader placement and the score-relevant bonus fields.
    pub fn evaluate(
        cards: &[CardDetail],
        all_cards: &[CardDetail],
        options: &EvaluateOptions,
    ) -> Result<DeckDetail, DeckError> {
        if cards.is_empty() || cards.len() > MAX_DECK_SIZE {
            return Err(DeckError::InvalidDeckSize(cards.len()));
        }
        let card_num = cards.len();

        // Occurrence counts drive both the power accessors and the
        // unit-scaled skills.
        let mut unit_counts = [0usize; Unit::ALL.len()];
        let mut attr_counts = [0usize; Attribute::ALL.len()];
        for card in cards {
            attr_counts[card.attribute.index()] += 1;
            for unit in &card.units {
                unit_counts[unit.index()] += 1;
            }
        }
        let unit_num = unit_counts.iter().filter(|count| **count > 0).count();

        // Each card realizes the best power among its units.
        let card_power: Vec<CardPowerDetail> = cards
            .iter()
            .map(|card| {
                card.units
                    .iter()
                    .map(|unit| {
                        card.power
                            .detail(unit_counts[unit.index()], attr_counts[card.attribute.index()])
                    })
                    .max_by_key(|detail| detail.total)
                    .unwrap_or_else(|| card.power.detail(1, 1))
            })
            .collect();

        let power = DeckPowerDetail {
            base: card_power.iter().map(|p| p.base).sum(),
            area_item_bonus: card_power.iter().map(|p| p.area_item_bonus).sum(),
            character_bonus: card_power.iter().map(|p| p.character_bonus).sum(),
            honor_bonus: options.honor_bonus,
            fixture_bonus: card_power.iter().map(|p| p.fixture_bonus).sum(),
            gate_bonus: card_power.iter().map(|p| p.gate_bonus).sum(),
            total: card_power.iter().map(|p| p.total).sum::<u32>() + options.honor_bonus,
        };

        // Per-slot candidates: s1 = pre-training alternative, s2 = best
        // post-training value at the current occurrence counts.
        let mut prepared: Vec<(SkillPrepare, SkillPrepare)> = Vec::with_capacity(card_num);
        let mut double_mask = 0u32;
        let mut need_mask = 0u32;

        for (i, card) in cards.iter().enumerate() {
            let mut s2 = SkillPrepare::zero();
            for unit in &card.units {
                let current = card.skill.prepare(*unit, unit_counts[unit.index()]);
                if current.score_up_fixed > s2.score_up_fixed {
                    s2 = current;
                }
            }

            let mut s1 = SkillPrepare::zero();
            let mut needs_enumeration = false;
            if card.skill.has_pre_training() {
                if let Some(reference) = card.skill.reference_candidate() {
                    if reference.skill_id != s2.skill_id
                        && reference.score_up_fixed > s1.score_up_fixed
                    {
                        s1 = reference;
                        needs_enumeration = true;
                    }
                }
                if let Some(different) =
                    card.skill.different_unit_candidate(unit_num.saturating_sub(1))
                {
                    if different.skill_id != s2.skill_id
                        && different.score_up_fixed > s1.score_up_fixed
                    {
                        s1 = different;
                        needs_enumeration = false;
                    }
                }
                double_mask |= 1 << i;
            }

            if options.keep_training_state {
                if card.skill.has_pre_training()
                    && card.training_image != TrainingImage::SpecialTraining
                {
                    s2 = s1;
                }
            } else if card.skill.has_pre_training() {
                if needs_enumeration {
                    need_mask |= 1 << i;
                } else if s1.score_up_fixed > s2.score_up_fixed {
                    s2 = s1;
                }
            }

            prepared.push((s1, s2));
        }

        // Enumerate every submask of the ambiguous slots, full mask down to
        // zero inclusive; with no ambiguous slot this is a single direct
        // pass over the settled candidates. Exact score ties keep the
        // first assignment found.
        let mut mask = need_mask;
        let mut best = Self::resolve_mask(cards, &prepared, mask, options);
        while mask != 0 {
            mask = (mask - 1) & need_mask;
            let outcome = Self::resolve_mask(cards, &prepared, mask, options);
            if outcome.score > best.score {
                best = outcome;
            }
        }

        let deck_cards: Vec<DeckCardDetail> = best
            .order
            .iter()
            .map(|&idx| {
                let card = &cards[idx];
                let skill = &best.skills[idx];
                let uses_pre_training =
                    !skill.is_after_training && (double_mask & (1 << idx)) != 0;
                let training_image = if (double_mask & (1 << idx)) != 0 {
                    if skill.is_after_training {
                        TrainingImage::SpecialTraining
                    } else {
                        TrainingImage::Original
                    }
                } else {
                    card.training_image
                };
                DeckCardDetail {
                    card_id: card.card_id,
                    level: card.level,
                    skill_level: card.skill_level,
                    master_rank: card.master_rank,
                    power: card_power[idx],
                    event_bonus: card.event_bonus_text(),
                    skill: DeckCardSkillDetail {
                        score_up: skill.score_up_fixed,
                        life_recovery: skill.life_recovery,
                        is_pre_training: uses_pre_training,
                    },
                    training_image,
                }
            })
            .collect();

        let mut multi_live_score_up = best.skills[best.order[0]].score_up_fixed;
        for &idx in best.order.iter().skip(1) {
            multi_live_score_up += best.skills[idx].score_up_fixed * 0.2;
        }

        Ok(DeckDetail {
            power,
            event_bonus: Self::deck_event_bonus(cards, options),
            support_deck_bonus: Self::support_deck_bonus(cards, all_cards, options),
            cards: deck_cards,
            multi_live_score_up,
        })
    }

    /// Resolve one training-state assignment: settle reference skills,
    /// place the leader and score the whole deck.
    fn resolve_mask(
        cards: &[CardDetail],
        prepared: &[(SkillPrepare, SkillPrepare)],
        mask: u32,
        options: &EvaluateOptions,
    ) -> MaskOutcome {
        let card_num = cards.len();
        let mut skills: Vec<SkillPrepare> = (0..card_num)
            .map(|i| {
                let (s1, s2) = &prepared[i];
                let mut chosen = if mask & (1 << i) != 0 { *s1 } else { *s2 };
                chosen.score_up_to_reference = chosen.score_up_fixed;
                chosen
            })
            .collect();

        // Reference slots see the other members at their pre-settlement
        // values, so snapshot those first.
        let referenced: Vec<f64> = skills.iter().map(|s| s.score_up_to_reference).collect();
        for i in 0..card_num {
            let Some(params) = skills[i].reference else {
                continue;
            };
            let base_fixed = skills[i].score_up_fixed - params.max;
            let contributions: Vec<f64> = (0..card_num)
                .filter(|&j| j != i)
                .map(|j| (referenced[j] * params.rate / 100.0).floor().min(params.max))
                .collect();
            let chosen = if contributions.is_empty() {
                0.0
            } else {
                match options.reference_strategy {
                    SkillReferenceStrategy::Max => {
                        contributions.iter().copied().fold(f64::MIN, f64::max)
                    }
                    SkillReferenceStrategy::Min => {
                        contributions.iter().copied().fold(f64::MAX, f64::min)
                    }
                    SkillReferenceStrategy::Average => {
                        contributions.iter().sum::<f64>() / contributions.len() as f64
                    }
                }
            };
            skills[i].score_up_fixed = base_fixed + chosen;
        }

        let mut order: Vec<usize> = (0..card_num).collect();
        if options.best_skill_as_leader {
            let mut best_index = 0;
            for i in 1..card_num {
                let challenger = &skills[order[i]];
                let incumbent = &skills[order[best_index]];
                if challenger.score_up_fixed > incumbent.score_up_fixed
                    || (challenger.score_up_fixed == incumbent.score_up_fixed
                        && cards[order[i]].card_id < cards[order[best_index]].card_id)
                {
                    best_index = i;
                }
            }
            order.swap(0, best_index);
        }

        let score = order
            .iter()
            .map(|&idx| skills[idx].score_up_fixed)
            .sum::<f64>();

        MaskOutcome {
            order,
            skills,
            score,
        }
    }

    /// Deck-wide event bonus: the (optionally capped) sum of per-card
    /// bonuses, plus the attribute-diversity bonus when a table is set.
    fn deck_event_bonus(cards: &[CardDetail], options: &EvaluateOptions) -> Option<f64> {
        let mut bonuses: Vec<f64> = cards.iter().filter_map(|card| card.event_bonus).collect();
        if bonuses.is_empty() && options.attribute_diversity_bonuses.is_none() {
            return None;
        }
        bonuses.sort_by(|a, b| b.partial_cmp(a).unwrap_or(core::cmp::Ordering::Equal));
        let counted = options.bonus_card_limit.unwrap_or(bonuses.len());
        let mut total: f64 = bonuses.iter().take(counted).sum();

        if let Some(table) = &options.attribute_diversity_bonuses {
            let mut seen = [false; Attribute::ALL.len()];
            for card in cards {
                seen[card.attribute.index()] = true;
            }
            let distinct = seen.iter().filter(|s| **s).count();
            if let Some(entry) = table
                .iter()
                .find(|entry| entry.distinct_attributes == distinct)
            {
                total += entry.bonus;
            }
        }
        Some(total)
    }

    /// Sum of the best support bonuses in the rest of the pool. Only
    /// meaningful for events that field a support deck.
    fn support_deck_bonus(
        cards: &[CardDetail],
        all_cards: &[CardDetail],
        options: &EvaluateOptions,
    ) -> Option<f64> {
        options.attribute_diversity_bonuses.as_ref()?;
        let mut bonuses: Vec<f64> = all_cards
            .iter()
            .filter(|candidate| !cards.iter().any(|card| card.card_id == candidate.card_id))
            .filter_map(|candidate| candidate.support_bonus)
            .collect();
        bonuses.sort_by(|a, b| b.partial_cmp(a).unwrap_or(core::cmp::Ordering::Equal));
        Some(bonuses.iter().take(SUPPORT_DECK_SIZE).sum())
    }
}
