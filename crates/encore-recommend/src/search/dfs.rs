use crate::search::deadline::Deadline;
use crate::search::merge::{TopDecks, deck_hash};
use encore_core::deck::{DeckCalculator, DeckDetail, DeckError, EvaluateOptions, RecommendDeck};
use encore_core::model::{Attribute, CardDetail};
use std::collections::HashSet;
use tracing::debug;

/// One exact search pass over a (possibly filtered) pool.
pub(crate) struct DfsRequest<'a> {
    pub pool: &'a [CardDetail],
    /// Full pool, for the support-deck bonus.
    pub all_cards: &'a [CardDetail],
    pub member: usize,
    pub limit: usize,
    pub leader_character: Option<u32>,
    pub challenge_live: bool,
    /// Prune branches that cannot reach this many distinct attributes;
    /// zero disables the rule.
    pub min_distinct_attributes: usize,
    /// Must carry `best_skill_as_leader: false`; leader placement is
    /// verified at the leaf instead.
    pub options: &'a EvaluateOptions,
    pub deadline: &'a Deadline,
}

pub(crate) struct DfsOutcome {
    pub decks: Vec<RecommendDeck>,
    /// False when the deadline cut the pass short.
    pub completed: bool,
}

pub(crate) fn find_best_decks<F>(
    req: &DfsRequest<'_>,
    score_fn: &F,
) -> Result<DfsOutcome, DeckError>
where
    F: Fn(&DeckDetail) -> f64,
{
    let mut state = DfsState {
        req,
        score_fn,
        seen: HashSet::new(),
        results: TopDecks::new(req.limit),
        timed_out: false,
    };
    let mut deck = Vec::with_capacity(req.member);
    state.descend(&mut deck)?;
    debug!(
        pool = req.pool.len(),
        results = state.results.len(),
        completed = !state.timed_out,
        "dfs pass finished"
    );
    Ok(DfsOutcome {
        decks: state.results.into_decks(),
        completed: !state.timed_out,
    })
}

struct DfsState<'a, F> {
    req: &'a DfsRequest<'a>,
    score_fn: &'a F,
    seen: HashSet<u32>,
    results: TopDecks,
    timed_out: bool,
}

impl<F> DfsState<'_, F>
where
    F: Fn(&DeckDetail) -> f64,
{
    fn descend(&mut self, deck: &mut Vec<usize>) -> Result<(), DeckError> {
        if self.timed_out || self.req.deadline.expired() {
            self.timed_out = true;
            return Ok(());
        }
        if deck.len() == self.req.member {
            return self.evaluate_leaf(deck);
        }

        let pool = self.req.pool;
        let mut prev_sibling: Option<usize> = None;
        for i in 0..pool.len() {
            if self.req.deadline.expired() {
                self.timed_out = true;
                return Ok(());
            }
            let card = &pool[i];
            if deck.iter().any(|&j| pool[j].card_id == card.card_id) {
                continue;
            }
            if !self.req.challenge_live
                && deck.iter().any(|&j| pool[j].character_id == card.character_id)
            {
                continue;
            }
            if deck.is_empty() {
                if let Some(character) = self.req.leader_character {
                    if card.character_id != character {
                        continue;
                    }
                }
            } else {
                let leader = &pool[deck[0]];
                // A candidate whose skill certainly beats the assumed
                // leader's belongs in a deck led by itself.
                if self.req.leader_character.is_none()
                    && leader.skill.is_certainly_weaker_than(&card.skill)
                {
                    continue;
                }
                if card.attribute != leader.attribute && !card.shares_any_unit(leader) {
                    continue;
                }
            }
            if self.req.min_distinct_attributes > 0
                && !self.attribute_goal_reachable(deck, card)
            {
                continue;
            }
            // Non-leader slots fill in one canonical order so each multiset
            // is visited exactly once per leader.
            if deck.len() >= 2 {
                let prev = &pool[*deck.last().unwrap_or(&0)];
                if !Self::follows(prev, card) {
                    continue;
                }
            }
            if let Some(p) = prev_sibling {
                if card.is_certainly_weaker_than(&pool[p]) {
                    continue;
                }
            }
            prev_sibling = Some(i);
            deck.push(i);
            self.descend(deck)?;
            deck.pop();
            if self.timed_out {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Canonical slot order: strictly weaker cards always may follow,
    /// certainly stronger ones never do, incomparable pairs go by
    /// ascending card id.
    fn follows(prev: &CardDetail, candidate: &CardDetail) -> bool {
        if prev.is_certainly_weaker_than(candidate) {
            return false;
        }
        if candidate.is_certainly_weaker_than(prev) {
            return true;
        }
        candidate.card_id > prev.card_id
    }

    fn attribute_goal_reachable(&self, deck: &[usize], candidate: &CardDetail) -> bool {
        let mut seen = [false; Attribute::ALL.len()];
        for &j in deck {
            seen[self.req.pool[j].attribute.index()] = true;
        }
        seen[candidate.attribute.index()] = true;
        let distinct = seen.iter().filter(|s| **s).count();
        let remaining = self.req.member - deck.len() - 1;
        distinct + remaining >= self.req.min_distinct_attributes
    }

    fn evaluate_leaf(&mut self, deck: &[usize]) -> Result<(), DeckError> {
        let mut cards: Vec<CardDetail> =
            deck.iter().map(|&i| self.req.pool[i].clone()).collect();
        let mut detail = DeckCalculator::evaluate(&cards, self.req.all_cards, self.req.options)?;

        // The search assumed the first pick leads. When the realized
        // strongest skill sits elsewhere, swap it forward and re-evaluate
        // exactly once; the second result is accepted as-is.
        if self.req.leader_character.is_none() {
            let best = Self::realized_best_slot(&detail);
            if best != 0 {
                cards.swap(0, best);
                detail =
                    DeckCalculator::evaluate(&cards, self.req.all_cards, self.req.options)?;
            }
        }

        let hash = deck_hash(&detail.card_ids());
        if !self.seen.insert(hash) {
            return Ok(());
        }
        let score = (self.score_fn)(&detail);
        self.results.push(hash, RecommendDeck { score, detail });
        Ok(())
    }

    fn realized_best_slot(detail: &DeckDetail) -> usize {
        let mut best = 0;
        for (i, slot) in detail.cards.iter().enumerate().skip(1) {
            let incumbent = &detail.cards[best];
            if slot.skill.score_up > incumbent.skill.score_up
                || (slot.skill.score_up == incumbent.skill.score_up
                    && slot.card_id < incumbent.card_id)
            {
                best = i;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::{DfsRequest, find_best_decks};
    use crate::search::deadline::Deadline;
    use crate::search::merge::deck_hash;
    use encore_core::deck::{DeckDetail, EvaluateOptions};
    use encore_core::model::{
        Attribute, CardDetail, CardPower, CardSkill, TrainingImage, Unit,
    };
    use std::time::Duration;

    fn card(card_id: u32, character_id: u32, power: u32, score_up: f64) -> CardDetail {
        CardDetail {
            card_id,
            character_id,
            attribute: Attribute::Cool,
            units: vec![Unit::Aurora],
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

    fn score_power(detail: &DeckDetail) -> f64 {
        f64::from(detail.power.total) * (1.0 + detail.multi_live_score_up / 100.0)
    }

    fn options() -> EvaluateOptions {
        EvaluateOptions {
            best_skill_as_leader: false,
            ..EvaluateOptions::default()
        }
    }

    fn request<'a>(
        pool: &'a [CardDetail],
        member: usize,
        limit: usize,
        options: &'a EvaluateOptions,
        deadline: &'a Deadline,
    ) -> DfsRequest<'a> {
        DfsRequest {
            pool,
            all_cards: pool,
            member,
            limit,
            leader_character: None,
            challenge_live: false,
            min_distinct_attributes: 0,
            options,
            deadline,
        }
    }

    #[test]
    fn exact_pool_yields_one_deck_led_by_the_best_skill() {
        let pool: Vec<_> = (1..=5)
            .map(|id| card(id, id, 10_000, 40.0 + f64::from(id) * 10.0))
            .collect();
        let options = options();
        let deadline = Deadline::new(Duration::from_secs(10));
        let outcome =
            find_best_decks(&request(&pool, 5, 10, &options, &deadline), &score_power)
                .unwrap();
        assert!(outcome.completed);
        assert_eq!(outcome.decks.len(), 1);
        // Card 5 carries the strongest skill and must lead.
        assert_eq!(outcome.decks[0].detail.leader().card_id, 5);
    }

    #[test]
    fn results_are_distinct_by_hash() {
        let pool: Vec<_> = (1..=8)
            .map(|id| card(id, id, 10_000 + id * 50, 40.0 + f64::from(id)))
            .collect();
        let options = options();
        let deadline = Deadline::new(Duration::from_secs(10));
        let outcome =
            find_best_decks(&request(&pool, 3, 20, &options, &deadline), &score_power)
                .unwrap();
        assert!(outcome.completed);
        let mut hashes: Vec<u32> = outcome
            .decks
            .iter()
            .map(|deck| deck_hash(&deck.detail.card_ids()))
            .collect();
        hashes.sort_unstable();
        hashes.dedup();
        assert_eq!(hashes.len(), outcome.decks.len());
        // Scores come back descending.
        for pair in outcome.decks.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn expired_deadline_returns_partial_results_without_panicking() {
        let pool: Vec<_> = (1..=30)
            .map(|id| card(id, id, 10_000, 50.0))
            .collect();
        let options = options();
        let deadline = Deadline::new(Duration::ZERO);
        let outcome =
            find_best_decks(&request(&pool, 5, 10, &options, &deadline), &score_power)
                .unwrap();
        assert!(!outcome.completed);
        assert!(outcome.decks.is_empty());
    }

    #[test]
    fn challenge_mode_allows_repeated_characters() {
        let pool: Vec<_> = (1..=3).map(|id| card(id, 7, 10_000, 50.0)).collect();
        let options = options();
        let deadline = Deadline::new(Duration::from_secs(10));

        let mut req = request(&pool, 3, 10, &options, &deadline);
        let outcome = find_best_decks(&req, &score_power).unwrap();
        assert!(outcome.completed);
        assert!(outcome.decks.is_empty());

        req.challenge_live = true;
        let outcome = find_best_decks(&req, &score_power).unwrap();
        assert!(outcome.completed);
        assert_eq!(outcome.decks.len(), 1);
        assert_eq!(outcome.decks[0].detail.cards.len(), 3);
    }

    #[test]
    fn pinned_leader_heads_every_deck() {
        let pool: Vec<_> = (1..=6)
            .map(|id| card(id, id, 10_000, 40.0 + f64::from(id) * 10.0))
            .collect();
        let options = options();
        let deadline = Deadline::new(Duration::from_secs(10));
        let mut req = request(&pool, 3, 20, &options, &deadline);
        req.leader_character = Some(2);
        let outcome = find_best_decks(&req, &score_power).unwrap();
        assert!(outcome.completed);
        assert!(!outcome.decks.is_empty());
        for deck in &outcome.decks {
            assert_eq!(deck.detail.leader().card_id, 2);
        }
    }

    #[test]
    fn diversity_pruning_keeps_only_reachable_branches() {
        // Four Cool cards and one of each remaining attribute: with a
        // three-attribute floor, all-Cool decks must never appear.
        let mut pool: Vec<_> = (1..=4).map(|id| card(id, id, 10_000, 50.0)).collect();
        for (offset, attribute) in [
            Attribute::Cute,
            Attribute::Happy,
            Attribute::Mysterious,
            Attribute::Pure,
        ]
        .into_iter()
        .enumerate()
        {
            let id = 5 + offset as u32;
            let mut extra = card(id, id, 10_000, 50.0);
            extra.attribute = attribute;
            pool.push(extra);
        }
        let options = options();
        let deadline = Deadline::new(Duration::from_secs(10));
        let mut req = request(&pool, 4, 50, &options, &deadline);
        req.min_distinct_attributes = 3;
        let outcome = find_best_decks(&req, &score_power).unwrap();
        assert!(outcome.completed);
        assert!(!outcome.decks.is_empty());
        for deck in &outcome.decks {
            let mut seen = [false; Attribute::ALL.len()];
            for slot in &deck.detail.cards {
                let card = pool.iter().find(|c| c.card_id == slot.card_id).unwrap();
                seen[card.attribute.index()] = true;
            }
            assert!(seen.iter().filter(|s| **s).count() >= 3);
        }
    }
}
