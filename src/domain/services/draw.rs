use rand::Rng;
use rand::seq::SliceRandom;
use crate::domain::models::deck::{Card, DrawnCard, Orientation};
use crate::error::AppError;

/// Samples `count` distinct cards from `pool` and gives each an independent coin-flip
/// orientation. Draw order is the order the cards came out of the shuffle.
pub fn draw<R: Rng + ?Sized>(pool: &[Card], count: usize, rng: &mut R) -> Result<Vec<DrawnCard>, AppError> {
    if count > pool.len() {
        return Err(AppError::InsufficientCards { needed: count, available: pool.len() });
    }

    let mut candidates: Vec<&Card> = pool.iter().collect();
    let (chosen, _) = candidates.partial_shuffle(rng, count);

    let drawn = chosen
        .iter()
        .map(|card| DrawnCard {
            card: (*card).clone(),
            orientation: Orientation::from_reversed(rng.gen_bool(0.5)),
        })
        .collect();

    Ok(drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::deck::NewCardParams;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn deck(size: usize) -> Vec<Card> {
        (0..size)
            .map(|i| Card::new(NewCardParams {
                deck_id: "deck".into(),
                name: format!("Card {}", i),
                image_url: None,
                meaning_upright: format!("upright {}", i),
                meaning_reversed: format!("reversed {}", i),
                sort_order: i as i64,
            }))
            .collect()
    }

    #[test]
    fn test_draw_returns_distinct_members_of_pool() {
        let pool = deck(22);
        let ids: HashSet<&str> = pool.iter().map(|c| c.id.as_str()).collect();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for count in [0, 1, 3, 10, 22] {
                let drawn = draw(&pool, count, &mut rng).unwrap();
                assert_eq!(drawn.len(), count);

                let unique: HashSet<&str> = drawn.iter().map(|d| d.card.id.as_str()).collect();
                assert_eq!(unique.len(), count, "a card repeated within one draw");
                assert!(unique.is_subset(&ids));
            }
        }
    }

    #[test]
    fn test_draw_more_than_pool_fails_with_counts() {
        let pool = deck(2);
        let mut rng = StdRng::seed_from_u64(7);
        match draw(&pool, 3, &mut rng) {
            Err(AppError::InsufficientCards { needed, available }) => {
                assert_eq!(needed, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientCards, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_same_seed_gives_same_draw() {
        let pool = deck(10);
        let a = draw(&pool, 4, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = draw(&pool, 4, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_orientation_is_roughly_balanced() {
        let pool = deck(78);
        let mut rng = StdRng::seed_from_u64(2024);
        let mut reversed = 0;
        let mut total = 0;
        for _ in 0..200 {
            for card in draw(&pool, 10, &mut rng).unwrap() {
                total += 1;
                if card.is_reversed() {
                    reversed += 1;
                }
            }
        }
        let ratio = reversed as f64 / total as f64;
        assert!((0.4..0.6).contains(&ratio), "reversed ratio {} is far from 0.5", ratio);
    }

    #[test]
    fn test_effective_meaning_follows_orientation() {
        let card = deck(1).remove(0);
        let upright = DrawnCard { card: card.clone(), orientation: Orientation::Upright };
        let reversed = DrawnCard { card, orientation: Orientation::Reversed };
        assert_eq!(upright.effective_meaning(), "upright 0");
        assert_eq!(reversed.effective_meaning(), "reversed 0");
    }
}
