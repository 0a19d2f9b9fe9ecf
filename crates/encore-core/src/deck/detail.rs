use crate::model::{CardPowerDetail, TrainingImage};
use serde::{Deserialize, Serialize};

/// Power breakdown of a whole deck. `total` is always the exact sum of the
/// other six fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckPowerDetail {
    pub base: u32,
    pub area_item_bonus: u32,
    pub character_bonus: u32,
    pub honor_bonus: u32,
    pub fixture_bonus: u32,
    pub gate_bonus: u32,
    pub total: u32,
}

/// Realized skill of one deck slot after two-state resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckCardSkillDetail {
    pub score_up: f64,
    pub life_recovery: u32,
    /// True when the pre-training alternative won the enumeration.
    pub is_pre_training: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckCardDetail {
    pub card_id: u32,
    pub level: u32,
    pub skill_level: u32,
    pub master_rank: u32,
    pub power: CardPowerDetail,
    pub event_bonus: Option<String>,
    pub skill: DeckCardSkillDetail,
    pub training_image: TrainingImage,
}

/// Full evaluation of one concrete deck. Slot 0 of `cards` is the leader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckDetail {
    pub power: DeckPowerDetail,
    pub event_bonus: Option<f64>,
    pub support_deck_bonus: Option<f64>,
    pub cards: Vec<DeckCardDetail>,
    /// Cooperative-mode skill effect: only the leader fires at full
    /// strength, the rest contribute a fifth.
    pub multi_live_score_up: f64,
}

impl DeckDetail {
    pub fn leader(&self) -> &DeckCardDetail {
        &self.cards[0]
    }

    pub fn card_ids(&self) -> Vec<u32> {
        self.cards.iter().map(|card| card.card_id).collect()
    }
}

/// A scored deck as returned by the search engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendDeck {
    pub score: f64,
    pub detail: DeckDetail,
}
