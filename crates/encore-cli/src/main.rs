use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use encore_core::deck::{DeckDetail, SkillReferenceStrategy};
use encore_core::model::{CardDetail, Unit};
use encore_recommend::{Algorithm, DeckRecommend, EventConfig, EventKind, GaConfig, RecommendConfig};
use tracing_subscriber::EnvFilter;

/// Deck recommendation harness: loads a card pool and prints the top decks.
#[derive(Debug, Parser)]
#[command(
    name = "encore",
    author,
    version,
    about = "Finds the highest-scoring decks in a card pool"
)]
struct Cli {
    /// Path to the card pool (a JSON array of card snapshots).
    #[arg(short, long, value_name = "FILE")]
    pool: PathBuf,

    /// Number of decks to print.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Deck size.
    #[arg(long, default_value_t = 5)]
    member: usize,

    /// Pin the leader to this character id.
    #[arg(long, value_name = "CHARACTER")]
    leader: Option<u32>,

    /// Challenge live: repeated characters allowed.
    #[arg(long)]
    challenge: bool,

    /// Search algorithm.
    #[arg(long, value_enum, default_value_t = AlgorithmArg::Auto)]
    algorithm: AlgorithmArg,

    /// Scoring mode for ranking decks.
    #[arg(long, value_enum, default_value_t = ScoreArg::Multi)]
    score: ScoreArg,

    /// Wall-clock budget in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Seed for the stochastic engine (omit for entropy).
    #[arg(long)]
    seed: Option<u64>,

    /// Event family, carried for logging context.
    #[arg(long, value_enum)]
    event: Option<EventArg>,

    /// Event unit filter; solo-Session floaters always pass.
    #[arg(long, value_enum)]
    unit: Option<UnitArg>,

    /// Fixed honor bonus added to deck power.
    #[arg(long, default_value_t = 0)]
    honor_bonus: u32,

    /// Aggregation strategy for reference skills.
    #[arg(long, value_enum, default_value_t = StrategyArg::Average)]
    strategy: StrategyArg,

    /// Resolve skills at each card's stored training state.
    #[arg(long)]
    keep_training_state: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Auto,
    Ga,
    Dfs,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Auto => Algorithm::Auto,
            AlgorithmArg::Ga => Algorithm::Ga,
            AlgorithmArg::Dfs => Algorithm::Dfs,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScoreArg {
    /// Deck power only.
    Power,
    /// Power scaled by the summed skill effect.
    Solo,
    /// Power scaled by the cooperative skill effect and event bonus.
    Multi,
}

impl ScoreArg {
    fn score(self, detail: &DeckDetail) -> f64 {
        let power = f64::from(detail.power.total);
        match self {
            ScoreArg::Power => power,
            ScoreArg::Solo => {
                let skills: f64 = detail.cards.iter().map(|c| c.skill.score_up).sum();
                power * (1.0 + skills / 100.0)
            }
            ScoreArg::Multi => {
                power
                    * (1.0 + detail.multi_live_score_up / 100.0)
                    * (1.0 + detail.event_bonus.unwrap_or(0.0) / 100.0)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Max,
    Min,
    Average,
}

impl From<StrategyArg> for SkillReferenceStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Max => SkillReferenceStrategy::Max,
            StrategyArg::Min => SkillReferenceStrategy::Min,
            StrategyArg::Average => SkillReferenceStrategy::Average,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EventArg {
    Marathon,
    Cheerful,
    Bloom,
    Finale,
}

impl From<EventArg> for EventKind {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Marathon => EventKind::Marathon,
            EventArg::Cheerful => EventKind::Cheerful,
            EventArg::Bloom => EventKind::Bloom,
            EventArg::Finale => EventKind::Finale,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UnitArg {
    Aurora,
    Bliss,
    Chroma,
    Drive,
    Euphony,
    Session,
}

impl From<UnitArg> for Unit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Aurora => Unit::Aurora,
            UnitArg::Bliss => Unit::Bliss,
            UnitArg::Chroma => Unit::Chroma,
            UnitArg::Drive => Unit::Drive,
            UnitArg::Euphony => Unit::Euphony,
            UnitArg::Session => Unit::Session,
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_pool(path: &PathBuf) -> Result<Vec<CardDetail>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading card pool from {}", path.display()))?;
    let pool: Vec<CardDetail> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing card pool from {}", path.display()))?;
    Ok(pool)
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let pool = load_pool(&cli.pool)?;
    tracing::info!(cards = pool.len(), "card pool loaded");

    let config = RecommendConfig {
        limit: cli.limit,
        member: cli.member,
        leader_character: cli.leader,
        challenge_live: cli.challenge,
        algorithm: cli.algorithm.into(),
        ga: GaConfig {
            seed: cli.seed,
            ..GaConfig::default()
        },
        timeout: Duration::from_millis(cli.timeout_ms),
        honor_bonus: cli.honor_bonus,
        reference_strategy: cli.strategy.into(),
        keep_training_state: cli.keep_training_state,
    };
    let event = EventConfig {
        kind: cli.event.map(EventKind::from),
        unit: cli.unit.map(Unit::from),
        ..EventConfig::default()
    };

    let score = cli.score;
    let recommendation = DeckRecommend::recommend_high_score_deck(
        &pool,
        move |detail| score.score(detail),
        &config,
        &event,
    )?;

    if !recommendation.exhaustive {
        tracing::warn!("search budget expired before the pool was exhausted");
    }
    println!("{}", serde_json::to_string_pretty(&recommendation.decks)?);
    Ok(())
}
