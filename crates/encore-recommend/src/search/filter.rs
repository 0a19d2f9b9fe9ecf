use encore_core::model::CardDetail;

/// Pool prefix sizes tried before falling back to the full pool.
const WIDEN_STEPS: [usize; 5] = [15, 25, 40, 60, 100];

/// Ranks a card pool once by a cheap desirability key and hands out
/// stepwise-growing prefixes, so the exact search can start on the most
/// promising cards and only widen when it comes up short.
#[derive(Debug)]
pub struct CardPriorityFilter {
    ranked: Vec<CardDetail>,
}

impl CardPriorityFilter {
    /// Cards of the pinned leader's character always sort ahead of the
    /// rest, so every prefix can still field the mandatory leader.
    pub fn new(pool: &[CardDetail], pinned_character: Option<u32>) -> Self {
        let mut ranked = pool.to_vec();
        ranked.sort_by(|a, b| {
            let a_pinned = pinned_character == Some(a.character_id);
            let b_pinned = pinned_character == Some(b.character_id);
            b_pinned
                .cmp(&a_pinned)
                .then_with(|| Self::desirability(b).total_cmp(&Self::desirability(a)))
                .then(a.card_id.cmp(&b.card_id))
        });
        Self { ranked }
    }

    fn desirability(card: &CardDetail) -> f64 {
        // Optimistic bounds only: a card is ranked by the best deck it
        // could conceivably serve, never penalized for a weak floor.
        card.skill.upper_bound() * 100.0
            + card.power.max_total() as f64 / 100.0
            + card.event_bonus.unwrap_or(0.0) * 100.0
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Next strictly larger prefix after one of `previous_len` cards, or
    /// the full pool once the step schedule is spent. `widen(len())` is the
    /// fixed point and returns the full pool again.
    pub fn widen(&self, previous_len: usize) -> &[CardDetail] {
        let next = WIDEN_STEPS
            .into_iter()
            .find(|&step| step > previous_len && step < self.ranked.len())
            .unwrap_or(self.ranked.len());
        &self.ranked[..next.max(previous_len.min(self.ranked.len()))]
    }
}

#[cfg(test)]
mod tests {
    use super::CardPriorityFilter;
    use encore_core::model::{
        Attribute, CardDetail, CardPower, CardSkill, TrainingImage, Unit,
    };

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

    fn pool(size: u32) -> Vec<CardDetail> {
        (1..=size)
            .map(|id| card(id, id, 10_000 + id * 10, f64::from(id)))
            .collect()
    }

    #[test]
    fn widening_is_strictly_monotonic_until_the_full_pool() {
        let pool = pool(70);
        let filter = CardPriorityFilter::new(&pool, None);
        let mut len = 0;
        let mut seen = Vec::new();
        loop {
            let subset = filter.widen(len);
            if subset.len() == len {
                break;
            }
            assert!(subset.len() > len);
            // Earlier prefixes stay prefixes of later ones.
            assert_eq!(&subset[..len], &seen[..]);
            seen = subset.to_vec();
            len = subset.len();
        }
        assert_eq!(len, 70);
    }

    #[test]
    fn small_pools_are_returned_whole() {
        let pool = pool(8);
        let filter = CardPriorityFilter::new(&pool, None);
        assert_eq!(filter.widen(0).len(), 8);
    }

    #[test]
    fn ranking_prefers_stronger_cards() {
        let pool = pool(30);
        let filter = CardPriorityFilter::new(&pool, None);
        let first = filter.widen(0);
        assert_eq!(first.len(), 15);
        // Desirability grows with the id in this pool.
        assert_eq!(first[0].card_id, 30);
        assert_eq!(first[14].card_id, 16);
    }

    #[test]
    fn pinned_character_cards_lead_every_prefix() {
        let mut pool = pool(30);
        // Character 1 owns the weakest card; pin it.
        pool.push(card(31, 1, 9_000, 0.5));
        let filter = CardPriorityFilter::new(&pool, Some(1));
        let first = filter.widen(0);
        assert_eq!(first[0].character_id, 1);
        assert_eq!(first[1].character_id, 1);
    }
}
