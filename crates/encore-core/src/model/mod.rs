pub mod attribute;
pub mod card;
pub mod power;
pub mod skill;
pub mod unit;

pub use attribute::Attribute;
pub use card::{CardDetail, TrainingImage};
pub use power::{CardPower, CardPowerDetail};
pub use skill::{
    CardSkill, PreTrainingKind, PreTrainingSkill, ReferenceParams, SkillPrepare, UnitScaling,
};
pub use unit::Unit;

/// Hard cap on deck size across the whole crate.
pub const MAX_DECK_SIZE: usize = 5;
