pub mod deadline;
mod dfs;
pub mod filter;
mod ga;
pub mod merge;

pub use deadline::{CancelToken, Deadline};
pub use filter::CardPriorityFilter;
pub use ga::GaConfig;
pub use merge::{deck_hash, update_deck};

use encore_core::deck::{
    AttributeDiversityBonus, DeckDetail, DeckError, EvaluateOptions, RecommendDeck,
    SkillReferenceStrategy,
};
use encore_core::model::{CardDetail, MAX_DECK_SIZE, Unit};
use std::collections::HashSet;
use std::fmt;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// GA first, exact DFS supplement when it comes up short.
    #[default]
    Auto,
    Ga,
    Dfs,
}

/// Request-scoped knobs for one recommendation call.
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    /// How many decks to return.
    pub limit: usize,
    pub member: usize,
    /// Pin the leader to this character.
    pub leader_character: Option<u32>,
    /// Challenge live: one player, repeated characters allowed.
    pub challenge_live: bool,
    pub algorithm: Algorithm,
    pub ga: GaConfig,
    pub timeout: Duration,
    pub honor_bonus: u32,
    pub reference_strategy: SkillReferenceStrategy,
    pub keep_training_state: bool,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            member: MAX_DECK_SIZE,
            leader_character: None,
            challenge_live: false,
            algorithm: Algorithm::default(),
            ga: GaConfig::default(),
            timeout: Duration::from_secs(10),
            honor_bonus: 0,
            reference_strategy: SkillReferenceStrategy::default(),
            keep_training_state: false,
        }
    }
}

/// Broad event family. Behavior is driven by the explicit `EventConfig`
/// fields; the kind travels with the request for callers and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Marathon,
    Cheerful,
    Bloom,
    Finale,
}

/// Event-shaped constraints on the candidate pool and scoring.
#[derive(Debug, Clone, Default)]
pub struct EventConfig {
    pub kind: Option<EventKind>,
    /// Only cards of this unit may enter (solo-Session floaters always
    /// pass).
    pub unit: Option<Unit>,
    /// Finale shows pin the leader to the featured character.
    pub finale_character: Option<u32>,
    pub attribute_diversity_bonuses: Option<Vec<AttributeDiversityBonus>>,
    pub bonus_card_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// Descending by score, at most `limit` entries.
    pub decks: Vec<RecommendDeck>,
    /// True only when an exact pass finished the whole pool in budget.
    pub exhaustive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendError {
    MemberOutOfRange(usize),
    PoolTooSmall { available: usize, member: usize },
    LeaderNotInPool(u32),
    /// The whole pool was searched and no valid deck exists.
    Exhausted,
    /// The background worker exited without sending a result.
    WorkerFailed,
    Deck(DeckError),
}

impl fmt::Display for RecommendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendError::MemberOutOfRange(member) => {
                write!(f, "member count {member} is outside 1..={MAX_DECK_SIZE}")
            }
            RecommendError::PoolTooSmall { available, member } => {
                write!(f, "pool offers {available} candidates for {member} slots")
            }
            RecommendError::LeaderNotInPool(character) => {
                write!(f, "no card of leader character {character} in the pool")
            }
            RecommendError::Exhausted => f.write_str("no valid deck exists in the pool"),
            RecommendError::WorkerFailed => {
                f.write_str("background worker exited without a result")
            }
            RecommendError::Deck(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for RecommendError {}

impl From<DeckError> for RecommendError {
    fn from(err: DeckError) -> Self {
        RecommendError::Deck(err)
    }
}

/// Entry point: finds the top-`limit` highest-scoring decks in the pool.
pub struct DeckRecommend;

impl DeckRecommend {
    pub fn recommend_high_score_deck<F>(
        pool: &[CardDetail],
        score_fn: F,
        config: &RecommendConfig,
        event: &EventConfig,
    ) -> Result<Recommendation, RecommendError>
    where
        F: Fn(&DeckDetail) -> f64,
    {
        let deadline = Deadline::new(config.timeout);
        Self::recommend_with_deadline(pool, &score_fn, config, event, &deadline)
    }

    fn recommend_with_deadline<F>(
        pool: &[CardDetail],
        score_fn: &F,
        config: &RecommendConfig,
        event: &EventConfig,
        deadline: &Deadline,
    ) -> Result<Recommendation, RecommendError>
    where
        F: Fn(&DeckDetail) -> f64,
    {
        if config.member == 0 || config.member > MAX_DECK_SIZE {
            return Err(RecommendError::MemberOutOfRange(config.member));
        }

        let candidates: Vec<CardDetail> = match event.unit {
            Some(unit) => pool.iter().filter(|c| c.matches_unit(unit)).cloned().collect(),
            None => pool.to_vec(),
        };

        let leader_character = config.leader_character.or(event.finale_character);
        if let Some(character) = leader_character {
            if !candidates.iter().any(|c| c.character_id == character) {
                return Err(RecommendError::LeaderNotInPool(character));
            }
        }

        let member;
        if config.challenge_live {
            member = config.member.min(candidates.len());
            if member == 0 {
                return Err(RecommendError::PoolTooSmall {
                    available: 0,
                    member: config.member,
                });
            }
        } else {
            member = config.member;
            let characters: HashSet<u32> =
                candidates.iter().map(|c| c.character_id).collect();
            if characters.len() < member {
                return Err(RecommendError::PoolTooSmall {
                    available: characters.len(),
                    member,
                });
            }
        }

        let options = EvaluateOptions {
            honor_bonus: config.honor_bonus,
            bonus_card_limit: event.bonus_card_limit,
            attribute_diversity_bonuses: event.attribute_diversity_bonuses.clone(),
            reference_strategy: config.reference_strategy,
            keep_training_state: config.keep_training_state,
            best_skill_as_leader: leader_character.is_none(),
        };
        let min_distinct_attributes = match &event.attribute_diversity_bonuses {
            Some(_) => 3.min(member),
            None => 0,
        };

        info!(
            pool = candidates.len(),
            member,
            limit = config.limit,
            algorithm = ?config.algorithm,
            event = ?event.kind,
            "deck recommendation started"
        );

        match config.algorithm {
            Algorithm::Ga => {
                let decks =
                    Self::run_ga(&candidates, member, config, leader_character, &options, deadline, score_fn)?;
                Ok(Recommendation {
                    decks,
                    exhaustive: false,
                })
            }
            Algorithm::Dfs => Self::finish_with_dfs(
                &candidates,
                member,
                config,
                leader_character,
                min_distinct_attributes,
                &options,
                deadline,
                score_fn,
                Vec::new(),
            ),
            Algorithm::Auto => {
                let ga_decks =
                    Self::run_ga(&candidates, member, config, leader_character, &options, deadline, score_fn)?;
                debug!(decks = ga_decks.len(), "ga stage finished");
                if ga_decks.len() >= config.limit {
                    return Ok(Recommendation {
                        decks: ga_decks,
                        exhaustive: false,
                    });
                }
                Self::finish_with_dfs(
                    &candidates,
                    member,
                    config,
                    leader_character,
                    min_distinct_attributes,
                    &options,
                    deadline,
                    score_fn,
                    ga_decks,
                )
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_ga<F>(
        candidates: &[CardDetail],
        member: usize,
        config: &RecommendConfig,
        leader_character: Option<u32>,
        options: &EvaluateOptions,
        deadline: &Deadline,
        score_fn: &F,
    ) -> Result<Vec<RecommendDeck>, RecommendError>
    where
        F: Fn(&DeckDetail) -> f64,
    {
        let req = ga::GaRequest {
            pool: candidates,
            all_cards: candidates,
            member,
            limit: config.limit,
            leader_character,
            challenge_live: config.challenge_live,
            options,
            config: &config.ga,
            deadline,
        };
        Ok(ga::find_best_decks(&req, score_fn)?)
    }

    /// Exact search over stepwise-widening pool prefixes, merged over any
    /// decks an earlier stage produced.
    #[allow(clippy::too_many_arguments)]
    fn finish_with_dfs<F>(
        candidates: &[CardDetail],
        member: usize,
        config: &RecommendConfig,
        leader_character: Option<u32>,
        min_distinct_attributes: usize,
        options: &EvaluateOptions,
        deadline: &Deadline,
        score_fn: &F,
        seed_decks: Vec<RecommendDeck>,
    ) -> Result<Recommendation, RecommendError>
    where
        F: Fn(&DeckDetail) -> f64,
    {
        // The exact search places the leader itself at the leaf.
        let dfs_options = EvaluateOptions {
            best_skill_as_leader: false,
            ..options.clone()
        };
        let filter = CardPriorityFilter::new(candidates, leader_character);
        let mut decks = seed_decks;
        let mut exhaustive = false;
        let mut len = 0;
        loop {
            let subset = filter.widen(len);
            if subset.len() == len {
                break;
            }
            len = subset.len();
            debug!(subset = len, "dfs widening step");
            let req = dfs::DfsRequest {
                pool: subset,
                all_cards: candidates,
                member,
                limit: config.limit,
                leader_character,
                challenge_live: config.challenge_live,
                min_distinct_attributes,
                options: &dfs_options,
                deadline,
            };
            let outcome = dfs::find_best_decks(&req, score_fn)?;
            decks = update_deck(decks, outcome.decks, config.limit);
            if !outcome.completed {
                break;
            }
            if len == filter.len() {
                exhaustive = true;
                break;
            }
            if decks.len() >= config.limit {
                break;
            }
        }
        if exhaustive && decks.is_empty() {
            return Err(RecommendError::Exhausted);
        }
        Ok(Recommendation { decks, exhaustive })
    }
}

/// Handle to a recommendation running on its own thread.
pub struct RecommendHandle {
    receiver: mpsc::Receiver<Result<Recommendation, RecommendError>>,
    cancel: CancelToken,
}

impl RecommendHandle {
    /// Ask the worker to stop; it replies with its best-so-far result.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn try_recv(&self) -> Option<Result<Recommendation, RecommendError>> {
        self.receiver.try_recv().ok()
    }

    pub fn wait(self) -> Result<Recommendation, RecommendError> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(RecommendError::WorkerFailed),
        }
    }
}

/// Run a recommendation on a dedicated thread so the caller stays
/// responsive; the returned handle carries the result channel and a cancel
/// token folded into the worker's deadline.
pub fn recommend_in_background<F>(
    pool: Vec<CardDetail>,
    score_fn: F,
    config: RecommendConfig,
    event: EventConfig,
) -> RecommendHandle
where
    F: Fn(&DeckDetail) -> f64 + Send + 'static,
{
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let deadline = Deadline::with_cancel(config.timeout, worker_cancel);
        let result =
            DeckRecommend::recommend_with_deadline(&pool, &score_fn, &config, &event, &deadline);
        let _ = sender.send(result);
    });
    RecommendHandle { receiver, cancel }
}
