use crate::model::MAX_DECK_SIZE;
use serde::{Deserialize, Serialize};

/// One card's power contribution for a concrete deck composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPowerDetail {
    pub base: u32,
    pub area_item_bonus: u32,
    pub character_bonus: u32,
    pub fixture_bonus: u32,
    pub gate_bonus: u32,
    pub total: u32,
}

/// Composition-dependent power accessor. The area-item bonus scales with
/// how many deck members share one of the card's units and how many share
/// its attribute; the remaining bonuses are fixed per card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPower {
    pub base: u32,
    pub character_bonus: u32,
    pub fixture_bonus: u32,
    pub gate_bonus: u32,
    /// Permille of `base` granted per same-unit member.
    pub unit_item_rate: u32,
    /// Permille of `base` granted per same-attribute member.
    pub attr_item_rate: u32,
}

impl CardPower {
    pub const fn fixed(base: u32) -> Self {
        Self {
            base,
            character_bonus: 0,
            fixture_bonus: 0,
            gate_bonus: 0,
            unit_item_rate: 0,
            attr_item_rate: 0,
        }
    }

    /// Realized breakdown when `unit_count` deck members share the queried
    /// unit and `attr_count` share the card's attribute (both include the
    /// card itself, so they are at least 1).
    pub fn detail(&self, unit_count: usize, attr_count: usize) -> CardPowerDetail {
        let rate = self.unit_item_rate * unit_count as u32 + self.attr_item_rate * attr_count as u32;
        let area_item_bonus = self.base * rate / 1000;
        CardPowerDetail {
            base: self.base,
            area_item_bonus,
            character_bonus: self.character_bonus,
            fixture_bonus: self.fixture_bonus,
            gate_bonus: self.gate_bonus,
            total: self.base
                + area_item_bonus
                + self.character_bonus
                + self.fixture_bonus
                + self.gate_bonus,
        }
    }

    /// Lowest total this card can realize in any deck.
    pub fn min_total(&self) -> u32 {
        self.detail(1, 1).total
    }

    /// Highest total this card can realize in any deck.
    pub fn max_total(&self) -> u32 {
        self.detail(MAX_DECK_SIZE, MAX_DECK_SIZE).total
    }
}
