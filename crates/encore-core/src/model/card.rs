use crate::model::attribute::Attribute;
use crate::model::power::CardPower;
use crate::model::skill::CardSkill;
use crate::model::unit::Unit;
use serde::{Deserialize, Serialize};

/// Display state of the card art, which also records which training state
/// the player keeps the card in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingImage {
    Original,
    SpecialTraining,
}

/// Immutable per-card snapshot consumed by evaluation and search. Produced
/// upstream from master/user data; never mutated during a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDetail {
    pub card_id: u32,
    pub character_id: u32,
    pub attribute: Attribute,
    /// 1..=2 affiliation tags the card counts toward.
    pub units: Vec<Unit>,
    pub level: u32,
    pub skill_level: u32,
    pub master_rank: u32,
    pub power: CardPower,
    pub skill: CardSkill,
    /// Event bonus percentage, when an event is running.
    pub event_bonus: Option<f64>,
    /// Support-deck bonus percentage, when the event has a support deck.
    pub support_bonus: Option<f64>,
    pub training_image: TrainingImage,
}

impl CardDetail {
    pub fn shares_any_unit(&self, other: &CardDetail) -> bool {
        self.units.iter().any(|unit| other.units.contains(unit))
    }

    /// True when the card passes a unit filter: it carries the unit, or it
    /// is a pure floater (`Session` only) and counts toward any group.
    pub fn matches_unit(&self, unit: Unit) -> bool {
        self.units.contains(&unit) || (self.units.len() == 1 && self.units[0].is_session())
    }

    /// Conservative dominance test usable before the deck composition is
    /// known: true only when `other` is at least as good in skill, power
    /// and event bonus in every composition. Never true for a card that
    /// could still win on any axis.
    pub fn is_certainly_weaker_than(&self, other: &CardDetail) -> bool {
        self.skill.is_certainly_weaker_than(&other.skill)
            && self.power.max_total() <= other.power.min_total()
            && self.event_bonus.unwrap_or(0.0) <= other.event_bonus.unwrap_or(0.0)
    }

    /// Display text for the card's event bonus, if any.
    pub fn event_bonus_text(&self) -> Option<String> {
        self.event_bonus.map(|bonus| format!("+{bonus}%"))
    }
}

#[cfg(test)]
mod tests {
    use super::{CardDetail, TrainingImage};
    use crate::model::attribute::Attribute;
    use crate::model::power::CardPower;
    use crate::model::skill::CardSkill;
    use crate::model::unit::Unit;

    fn card(card_id: u32, units: Vec<Unit>, power: u32, score_up: f64) -> CardDetail {
        CardDetail {
            card_id,
            character_id: card_id,
            attribute: Attribute::Cool,
            units,
            level: 60,
            skill_level: 4,
            master_rank: 0,
            power: CardPower::fixed(power),
            skill: CardSkill::fixed(card_id, score_up),
            event_bonus: None,
            support_bonus: None,
            training_image: TrainingImage::SpecialTraining,
        }
    }

    #[test]
    fn session_only_cards_match_every_unit_filter() {
        let floater = card(1, vec![Unit::Session], 10_000, 50.0);
        assert!(floater.matches_unit(Unit::Aurora));
        assert!(floater.matches_unit(Unit::Euphony));

        let grouped = card(2, vec![Unit::Aurora, Unit::Session], 10_000, 50.0);
        assert!(grouped.matches_unit(Unit::Aurora));
        assert!(!grouped.matches_unit(Unit::Bliss));
    }

    #[test]
    fn dominance_requires_every_axis() {
        let weak = card(1, vec![Unit::Aurora], 10_000, 40.0);
        let strong = card(2, vec![Unit::Aurora], 20_000, 100.0);
        assert!(weak.is_certainly_weaker_than(&strong));

        // Higher event bonus keeps the card alive even with weaker stats.
        let mut bonus_holder = card(3, vec![Unit::Aurora], 10_000, 40.0);
        bonus_holder.event_bonus = Some(25.0);
        assert!(!bonus_holder.is_certainly_weaker_than(&strong));
    }

    #[test]
    fn event_bonus_text_formats_percent() {
        let mut card = card(1, vec![Unit::Aurora], 10_000, 40.0);
        assert_eq!(card.event_bonus_text(), None);
        card.event_bonus = Some(25.0);
        assert_eq!(card.event_bonus_text().as_deref(), Some("+25%"));
    }
}
