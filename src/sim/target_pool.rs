//! Shuffle-bag of targets for the current level
//!
//! Non-sequence levels drain a shuffled copy of the category so every item is
//! announced once before any repeats. Sequence levels (alphabet, counting)
//! walk the items in order with a wrapping cursor.

use rand::Rng;
use rand::seq::SliceRandom;

use super::category::{Category, CategoryItem};

#[derive(Debug, Clone, Default)]
pub struct TargetPool {
    /// Remaining draws, popped from the back
    queue: Vec<CategoryItem>,
    /// Cursor for sequence levels
    sequence_index: usize,
    /// Identity of the last draw (for the refill boundary check)
    last_drawn: Option<String>,
    avoid_boundary_repeat: bool,
}

impl TargetPool {
    pub fn new(avoid_boundary_repeat: bool) -> Self {
        Self {
            avoid_boundary_repeat,
            ..Default::default()
        }
    }

    /// Replace the pool with a freshly shuffled copy of the category
    pub fn refill<R: Rng + ?Sized>(&mut self, category: &Category, rng: &mut R) {
        self.queue = category.items.clone();
        self.queue.shuffle(rng);

        if self.avoid_boundary_repeat && self.queue.len() > 1 {
            let first_draw = self.queue.len() - 1;
            if self.last_drawn.as_deref() == self.queue.get(first_draw).map(|i| i.identity.as_str()) {
                self.queue.swap(0, first_draw);
            }
        }
    }

    /// Next target for the level
    pub fn draw_next<R: Rng + ?Sized>(
        &mut self,
        category: &Category,
        rng: &mut R,
    ) -> Option<CategoryItem> {
        let item = if category.requires_sequence {
            let len = category.items.len();
            if len == 0 {
                return None;
            }
            let index = self.sequence_index % len;
            self.sequence_index = (index + 1) % len;
            category.items.get(index).cloned()
        } else {
            if self.queue.is_empty() {
                self.refill(category, rng);
            }
            self.queue.pop().or_else(|| category.items.first().cloned())
        };

        self.last_drawn = item.as_ref().map(|i| i.identity.clone());
        item
    }

    /// Drop queued draws and rewind the sequence cursor
    pub fn clear(&mut self) {
        self.queue.clear();
        self.sequence_index = 0;
        self.last_drawn = None;
    }

    pub fn reset_sequence(&mut self) {
        self.sequence_index = 0;
    }

    /// Draws left before the next refill
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::category::default_categories;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashSet;

    fn fruits() -> Category {
        default_categories().remove(0)
    }

    #[test]
    fn test_pool_is_a_permutation_then_refills() {
        let category = fruits();
        assert_eq!(category.items.len(), 9);
        let mut rng = Pcg32::seed_from_u64(7);
        let mut pool = TargetPool::new(false);

        let draws: Vec<_> = (0..9)
            .map(|_| pool.draw_next(&category, &mut rng).expect("item"))
            .collect();
        let unique: HashSet<_> = draws.iter().map(|i| i.identity.clone()).collect();
        assert_eq!(unique.len(), 9);
        assert!(draws.iter().all(|d| category.items.contains(d)));
        assert_eq!(pool.remaining(), 0);

        let tenth = pool.draw_next(&category, &mut rng).expect("item");
        assert!(category.items.contains(&tenth));
        assert_eq!(pool.remaining(), 8);
    }

    #[test]
    fn test_sequence_levels_wrap_in_order() {
        let category = default_categories().remove(1);
        assert!(category.requires_sequence);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pool = TargetPool::default();

        let draws: Vec<_> = (0..12)
            .map(|_| pool.draw_next(&category, &mut rng).expect("item").identity)
            .collect();
        assert_eq!(draws[0], "1");
        assert_eq!(draws[9], "10");
        assert_eq!(draws[10], "1");
        assert_eq!(draws[11], "2");

        pool.reset_sequence();
        assert_eq!(pool.draw_next(&category, &mut rng).expect("item").identity, "1");
    }

    #[test]
    fn test_boundary_repeat_avoided_when_enabled() {
        let category = fruits();
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut pool = TargetPool::new(true);
            let mut last = None;
            for _ in 0..27 {
                let item = pool.draw_next(&category, &mut rng).expect("item");
                assert_ne!(Some(item.identity.clone()), last, "seed {seed}");
                last = Some(item.identity);
            }
        }
    }

    #[test]
    fn test_clear_forces_refill() {
        let category = fruits();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pool = TargetPool::default();
        pool.draw_next(&category, &mut rng);
        pool.clear();
        assert_eq!(pool.remaining(), 0);
        pool.draw_next(&category, &mut rng);
        assert_eq!(pool.remaining(), 8);
    }
}
