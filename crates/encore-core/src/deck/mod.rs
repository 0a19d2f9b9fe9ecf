pub mod calculator;
pub mod detail;

pub use calculator::{
    AttributeDiversityBonus, DeckCalculator, DeckError, EvaluateOptions, SUPPORT_DECK_SIZE,
    SkillReferenceStrategy,
};
pub use detail::{
    DeckCardDetail, DeckCardSkillDetail, DeckDetail, DeckPowerDetail, RecommendDeck,
};
