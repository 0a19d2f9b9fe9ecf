#![deny(warnings)]

pub mod search;

pub use search::{
    Algorithm, CancelToken, CardPriorityFilter, Deadline, DeckRecommend, EventConfig, EventKind,
    GaConfig, Recommendation, RecommendConfig, RecommendError, RecommendHandle, deck_hash,
    recommend_in_background, update_deck,
};
