use crate::search::deadline::Deadline;
use crate::search::merge::{TopDecks, deck_hash};
use encore_core::deck::{DeckCalculator, DeckDetail, DeckError, EvaluateOptions, RecommendDeck};
use encore_core::model::CardDetail;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Tuning knobs for the stochastic engine. The defaults are sized for real
/// pools of a few hundred cards; tests shrink them.
#[derive(Debug, Clone)]
pub struct GaConfig {
    pub max_iter: usize,
    /// Stop after this many generations without a better best deck.
    pub max_iter_no_improve: usize,
    pub population_size: usize,
    pub parent_size: usize,
    pub elite_size: usize,
    pub crossover_rate: f64,
    pub base_mutation_rate: f64,
    /// Mutation rate gained per stale generation.
    pub no_improve_iter_to_mutation_rate: f64,
    /// Entropy-seeded when `None`; fix for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            max_iter_no_improve: 5,
            population_size: 2000,
            parent_size: 200,
            elite_size: 0,
            crossover_rate: 1.0,
            base_mutation_rate: 0.1,
            no_improve_iter_to_mutation_rate: 0.02,
            seed: None,
        }
    }
}

pub(crate) struct GaRequest<'a> {
    pub pool: &'a [CardDetail],
    pub all_cards: &'a [CardDetail],
    pub member: usize,
    pub limit: usize,
    pub leader_character: Option<u32>,
    pub challenge_live: bool,
    pub options: &'a EvaluateOptions,
    pub config: &'a GaConfig,
    pub deadline: &'a Deadline,
}

/// Individuals are index vectors into the pool; slot 0 is the assumed
/// leader and stays on the pinned character when one is configured.
type Genome = Vec<usize>;

pub(crate) fn find_best_decks<F>(
    req: &GaRequest<'_>,
    score_fn: &F,
) -> Result<Vec<RecommendDeck>, DeckError>
where
    F: Fn(&DeckDetail) -> f64,
{
    let mut engine = GaEngine::new(req);
    engine.run(score_fn)?;
    Ok(engine.results.into_decks())
}

struct GaEngine<'a> {
    req: &'a GaRequest<'a>,
    rng: SmallRng,
    /// Pool indices grouped by character, deterministic order.
    by_character: BTreeMap<u32, Vec<usize>>,
    characters: Vec<u32>,
    fitness_cache: HashMap<u32, f64>,
    results: TopDecks,
}

impl<'a> GaEngine<'a> {
    fn new(req: &'a GaRequest<'a>) -> Self {
        let mut by_character: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (i, card) in req.pool.iter().enumerate() {
            by_character.entry(card.character_id).or_default().push(i);
        }
        let characters: Vec<u32> = by_character.keys().copied().collect();
        let rng = match req.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            req,
            rng,
            by_character,
            characters,
            fitness_cache: HashMap::new(),
            results: TopDecks::new(req.limit),
        }
    }

    fn run<F>(&mut self, score_fn: &F) -> Result<(), DeckError>
    where
        F: Fn(&DeckDetail) -> f64,
    {
        let cfg = self.req.config;
        let mut population: Vec<Genome> = Vec::with_capacity(cfg.population_size);
        while population.len() < cfg.population_size {
            match self.random_genome() {
                Some(genome) => population.push(genome),
                None => break,
            }
        }
        if population.is_empty() {
            return Ok(());
        }

        let mut best_score = f64::MIN;
        let mut no_improve = 0usize;
        for iter in 0..cfg.max_iter {
            if self.req.deadline.expired() {
                debug!(iter, "ga stopped on deadline");
                break;
            }

            let mut scored: Vec<(f64, Genome)> = Vec::with_capacity(population.len());
            for genome in population.drain(..) {
                let score = self.evaluate(&genome, score_fn)?;
                scored.push((score, genome));
            }
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

            let generation_best = scored.first().map(|(score, _)| *score).unwrap_or(f64::MIN);
            if generation_best > best_score {
                best_score = generation_best;
                no_improve = 0;
            } else {
                no_improve += 1;
                if no_improve >= cfg.max_iter_no_improve {
                    debug!(iter, best_score, "ga converged");
                    break;
                }
            }

            let parents: Vec<Genome> = scored
                .iter()
                .take(cfg.parent_size.max(2).min(scored.len()))
                .map(|(_, genome)| genome.clone())
                .collect();
            let mutation_rate = cfg.base_mutation_rate
                + no_improve as f64 * cfg.no_improve_iter_to_mutation_rate;

            population.clear();
            for (_, genome) in scored.into_iter().take(cfg.elite_size) {
                population.push(genome);
            }
            let mut offspring_keys: HashSet<Vec<usize>> = HashSet::new();
            let mut attempts = 0usize;
            while population.len() < cfg.population_size
                && attempts < cfg.population_size * 4
            {
                attempts += 1;
                let a = &parents[self.rng.gen_range(0..parents.len())];
                let child = if self.rng.gen_bool(cfg.crossover_rate.clamp(0.0, 1.0)) {
                    let b = &parents[self.rng.gen_range(0..parents.len())];
                    self.crossover(a, b)
                } else {
                    a.clone()
                };
                let child = self.mutate(child, mutation_rate);
                // Population-level dedup keeps the gene pool diverse.
                let mut key = child.clone();
                key[1..].sort_unstable();
                if offspring_keys.insert(key) {
                    population.push(child);
                }
            }
            if population.is_empty() {
                break;
            }
        }

        // Score whatever generation was alive when the loop ended.
        for genome in &population {
            if self.req.deadline.expired() {
                break;
            }
            self.evaluate(genome, score_fn)?;
        }
        Ok(())
    }

    /// Fitness of one genome; memoized by deck hash, and the best decks are
    /// captured into the result set as a side effect.
    fn evaluate<F>(&mut self, genome: &Genome, score_fn: &F) -> Result<f64, DeckError>
    where
        F: Fn(&DeckDetail) -> f64,
    {
        let cards: Vec<CardDetail> = genome
            .iter()
            .map(|&i| self.req.pool[i].clone())
            .collect();
        let detail = DeckCalculator::evaluate(&cards, self.req.all_cards, self.req.options)?;
        let hash = deck_hash(&detail.card_ids());
        if let Some(&score) = self.fitness_cache.get(&hash) {
            return Ok(score);
        }
        let score = score_fn(&detail);
        self.fitness_cache.insert(hash, score);
        self.results.push(hash, RecommendDeck { score, detail });
        Ok(score)
    }

    fn random_genome(&mut self) -> Option<Genome> {
        if self.req.challenge_live {
            // Challenge pools repeat one character; sample distinct cards.
            // A pinned leader still claims slot 0.
            if self.req.pool.len() < self.req.member {
                return None;
            }
            let mut picked = Vec::with_capacity(self.req.member);
            if let Some(character) = self.req.leader_character {
                let leaders = self.by_character.get(&character)?;
                picked.push(leaders[self.rng.gen_range(0..leaders.len())]);
            }
            while picked.len() < self.req.member {
                let i = self.rng.gen_range(0..self.req.pool.len());
                if !picked.contains(&i) {
                    picked.push(i);
                }
            }
            return Some(picked);
        }

        let leader_char = match self.req.leader_character {
            Some(character) => character,
            None => self.characters[self.rng.gen_range(0..self.characters.len())],
        };
        let leader_cards = self.by_character.get(&leader_char)?;
        let mut genome = vec![leader_cards[self.rng.gen_range(0..leader_cards.len())]];
        let mut used: HashSet<u32> = HashSet::from([leader_char]);
        if self.characters.len() < self.req.member {
            return None;
        }
        while genome.len() < self.req.member {
            let character = self.characters[self.rng.gen_range(0..self.characters.len())];
            if !used.insert(character) {
                continue;
            }
            let cards = &self.by_character[&character];
            genome.push(cards[self.rng.gen_range(0..cards.len())]);
        }
        Some(genome)
    }

    /// Uniform crossover: keep a random subset of `a`, fill the holes with
    /// conflict-free genes from `b`, fall back to `a`'s original gene.
    fn crossover(&mut self, a: &Genome, b: &Genome) -> Genome {
        let mut kept: Vec<Option<usize>> = a
            .iter()
            .map(|&gene| self.rng.gen_bool(0.5).then_some(gene))
            .collect();
        // A pinned leader is never crossed away.
        if self.req.leader_character.is_some() {
            kept[0] = Some(a[0]);
        }
        for slot in 0..kept.len() {
            if kept[slot].is_some() {
                continue;
            }
            let current: Vec<usize> = kept.iter().flatten().copied().collect();
            let gene = b
                .iter()
                .copied()
                .find(|&gene| !self.conflicts(&current, gene))
                .or_else(|| (!self.conflicts(&current, a[slot])).then_some(a[slot]))
                .or_else(|| (0..self.req.pool.len()).find(|&gene| !self.conflicts(&current, gene)));
            match gene {
                Some(gene) => kept[slot] = Some(gene),
                // No conflict-free filler exists; keep the first parent.
                None => return a.clone(),
            }
        }
        kept.into_iter().flatten().collect()
    }

    fn conflicts(&self, genome: &[usize], gene: usize) -> bool {
        let card = &self.req.pool[gene];
        genome.iter().any(|&g| {
            let other = &self.req.pool[g];
            other.card_id == card.card_id
                || (!self.req.challenge_live && other.character_id == card.character_id)
        })
    }

    fn mutate(&mut self, mut genome: Genome, rate: f64) -> Genome {
        let rate = rate.clamp(0.0, 1.0);
        for slot in 0..genome.len() {
            if !self.rng.gen_bool(rate) {
                continue;
            }
            let pinned = (slot == 0)
                .then_some(self.req.leader_character)
                .flatten()
                .and_then(|character| self.by_character.get(&character));
            let replacement = match pinned {
                // The pinned slot mutates within its character only.
                Some(cards) => cards[self.rng.gen_range(0..cards.len())],
                None => self.rng.gen_range(0..self.req.pool.len()),
            };
            let rest: Vec<usize> = genome
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != slot)
                .map(|(_, &g)| g)
                .collect();
            if !self.conflicts(&rest, replacement) {
                genome[slot] = replacement;
            }
        }
        genome
    }
}
