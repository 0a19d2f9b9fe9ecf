use encore_core::deck::RecommendDeck;
use std::collections::HashSet;

/// Leader-sensitive deck hash: slot 0 stays in place, the remaining ids are
/// folded in ascending order so every non-leader permutation collides.
pub fn deck_hash(card_ids: &[u32]) -> u32 {
    let Some((&leader, rest)) = card_ids.split_first() else {
        return 0;
    };
    let mut sorted: Vec<u32> = rest.to_vec();
    sorted.sort_unstable();
    let mut hash = leader;
    for id in sorted {
        hash = hash.wrapping_mul(10_007).wrapping_add(id);
    }
    hash
}

fn deck_order(a: &(u32, RecommendDeck), b: &(u32, RecommendDeck)) -> std::cmp::Ordering {
    b.1.score
        .partial_cmp(&a.1.score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then(a.0.cmp(&b.0))
}

/// Merge two result sets: dedup by hash, sort descending by score with ties
/// broken by ascending hash, keep the best `limit`. The tie rule makes the
/// output independent of which engine produced a deck first.
pub fn update_deck(
    current: Vec<RecommendDeck>,
    incoming: Vec<RecommendDeck>,
    limit: usize,
) -> Vec<RecommendDeck> {
    let mut seen = HashSet::new();
    let mut entries: Vec<(u32, RecommendDeck)> = current
        .into_iter()
        .chain(incoming)
        .filter_map(|deck| {
            let hash = deck_hash(&deck.detail.card_ids());
            seen.insert(hash).then_some((hash, deck))
        })
        .collect();
    entries.sort_by(deck_order);
    entries.truncate(limit);
    entries.into_iter().map(|(_, deck)| deck).collect()
}

/// Running top-`limit` collection used inside one engine pass.
#[derive(Debug)]
pub(crate) struct TopDecks {
    limit: usize,
    entries: Vec<(u32, RecommendDeck)>,
}

impl TopDecks {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, hash: u32, deck: RecommendDeck) {
        let entry = (hash, deck);
        let at = self
            .entries
            .binary_search_by(|probe| deck_order(probe, &entry))
            .unwrap_or_else(|at| at);
        self.entries.insert(at, entry);
        self.entries.truncate(self.limit);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn into_decks(self) -> Vec<RecommendDeck> {
        self.entries.into_iter().map(|(_, deck)| deck).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{TopDecks, deck_hash, update_deck};
    use encore_core::deck::{
        DeckCardDetail, DeckCardSkillDetail, DeckDetail, DeckPowerDetail, RecommendDeck,
    };
    use encore_core::model::{CardPower, TrainingImage};

    fn deck(card_ids: &[u32], score: f64) -> RecommendDeck {
        let cards = card_ids
            .iter()
            .map(|&card_id| DeckCardDetail {
                card_id,
                level: 60,
                skill_level: 4,
                master_rank: 0,
                power: CardPower::fixed(10_000).detail(1, 1),
                event_bonus: None,
                skill: DeckCardSkillDetail {
                    score_up: 50.0,
                    life_recovery: 0,
                    is_pre_training: false,
                },
                training_image: TrainingImage::SpecialTraining,
            })
            .collect();
        RecommendDeck {
            score,
            detail: DeckDetail {
                power: DeckPowerDetail {
                    base: 0,
                    area_item_bonus: 0,
                    character_bonus: 0,
                    honor_bonus: 0,
                    fixture_bonus: 0,
                    gate_bonus: 0,
                    total: 0,
                },
                event_bonus: None,
                support_deck_bonus: None,
                cards,
                multi_live_score_up: 0.0,
            },
        }
    }

    #[test]
    fn hash_ignores_non_leader_order_but_not_the_leader() {
        assert_eq!(deck_hash(&[1, 2, 3, 4, 5]), deck_hash(&[1, 5, 4, 3, 2]));
        assert_ne!(deck_hash(&[1, 2, 3, 4, 5]), deck_hash(&[2, 1, 3, 4, 5]));
        assert_ne!(deck_hash(&[1, 2, 3]), deck_hash(&[1, 2, 4]));
    }

    #[test]
    fn update_deck_dedups_and_keeps_the_best() {
        let current = vec![deck(&[1, 2, 3], 100.0), deck(&[4, 5, 6], 90.0)];
        let incoming = vec![
            deck(&[1, 3, 2], 100.0), // same hash as the first entry
            deck(&[7, 8, 9], 95.0),
            deck(&[10, 11, 12], 80.0),
        ];
        let merged = update_deck(current, incoming, 3);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].detail.card_ids(), vec![1, 2, 3]);
        assert_eq!(merged[1].detail.card_ids(), vec![7, 8, 9]);
        assert_eq!(merged[2].detail.card_ids(), vec![4, 5, 6]);
    }

    #[test]
    fn merge_order_is_independent_of_engine_order() {
        let a = vec![deck(&[1, 2, 3], 90.0), deck(&[4, 5, 6], 90.0)];
        let b = vec![deck(&[7, 8, 9], 90.0)];
        let forward = update_deck(a.clone(), b.clone(), 3);
        let backward = update_deck(b, a, 3);
        assert_eq!(forward, backward);
    }

    #[test]
    fn top_decks_keeps_a_bounded_sorted_set() {
        let mut top = TopDecks::new(2);
        for (ids, score) in [
            (&[1u32, 2, 3][..], 50.0),
            (&[4, 5, 6][..], 70.0),
            (&[7, 8, 9][..], 60.0),
        ] {
            top.push(deck_hash(ids), deck(ids, score));
        }
        assert_eq!(top.len(), 2);
        let decks = top.into_decks();
        assert_eq!(decks[0].score, 70.0);
        assert_eq!(decks[1].score, 60.0);
    }
}
