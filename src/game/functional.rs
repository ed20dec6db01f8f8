//! Hand evaluation.
//!
//! Pure functions mapping a pool of real cards (jokers included) to the
//! best [`HandResult`] achievable by any 5-card sub-selection. Jokers are
//! free variables: every (value, suit) substitution is enumerated and the
//! maximal result kept, so category definitions stay orthogonal to
//! wildcard handling.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use super::constants::EVAL_HAND_SIZE;
use super::entities::{Card, Suit, Value};

/// Scoring categories, weakest first so the derived order ranks them.
/// Exotic categories sit interleaved by strength: Sandwich Hand above
/// Three of a Kind, Skipping Straight above Straight, Rainbow Straight
/// above Flush, Flush House above Straight Flush.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum HandCategory {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    SandwichHand,
    Straight,
    SkippingStraight,
    Flush,
    RainbowStraight,
    FullHouse,
    FourOfAKind,
    FlushHouse,
    StraightFlush,
    FiveOfAKind,
    FlushFive,
}

impl HandCategory {
    pub const COUNT: usize = 15;
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "hi",
            Self::OnePair => "1p",
            Self::TwoPair => "2p",
            Self::ThreeOfAKind => "3k",
            Self::SandwichHand => "sw",
            Self::Straight => "s8",
            Self::SkippingStraight => "sk",
            Self::Flush => "fs",
            Self::RainbowStraight => "rb",
            Self::FullHouse => "fh",
            Self::FourOfAKind => "4k",
            Self::FlushHouse => "xh",
            Self::StraightFlush => "sf",
            Self::FiveOfAKind => "5k",
            Self::FlushFive => "f5",
        };
        write!(f, "{repr}")
    }
}

/// The outcome of evaluating a pool: a category plus the tie-break ranks
/// that total-order any two results of the same category. Suits never
/// break ties. Created fresh each showdown, compared only.
#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandResult {
    pub category: HandCategory,
    pub tiebreaks: Vec<Value>,
}

impl fmt::Display for HandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.category, self.tiebreaks)
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum EvalError {
    /// Fewer than five cards reached the evaluator. Upstream integration
    /// error; the deal guarantees the minimum pool size.
    #[error("need at least 5 cards to evaluate, got {got}")]
    InsufficientCards { got: usize },
    /// The pool repeats a non-joker card. Deck integrity violation.
    #[error("duplicate card in pool: {card}")]
    InvalidHand { card: Card },
}

/// Evaluate a pool of real cards to its best 5-card result.
///
/// Deterministic for a given input multiset; the input ordering never
/// matters. Jokers may substitute for any (value, suit), including a
/// duplicate of a card already present (that is how Five of a Kind is
/// reached).
pub fn eval(pool: &[Card]) -> Result<HandResult, EvalError> {
    if pool.len() < EVAL_HAND_SIZE {
        return Err(EvalError::InsufficientCards { got: pool.len() });
    }
    let mut seen = HashSet::with_capacity(pool.len());
    for card in pool.iter().filter(|c| !c.is_joker()) {
        if !seen.insert(*card) {
            log::error!("duplicate {card} in hand pool; deck integrity violated");
            return Err(EvalError::InvalidHand { card: *card });
        }
    }

    let mut best = None;
    let mut combo = [Card::JOKER; EVAL_HAND_SIZE];
    choose(pool, 0, 0, &mut combo, &mut best);
    Ok(best.expect("a pool of 5+ cards has at least one selection"))
}

/// Indices of the maximal results, sorted ascending. More than one index
/// means a tie the caller splits.
#[must_use]
pub fn argmax(results: &[HandResult]) -> Vec<usize> {
    let Some(best) = results.iter().max() else {
        return Vec::new();
    };
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| *r == best)
        .map(|(i, _)| i)
        .collect()
}

/// Scalar strength in `[0, 1]` for the betting boundary. Monotone in the
/// result order: the category picks the band, the primary tie-break rank
/// moves within it.
#[must_use]
pub fn hand_strength(result: &HandResult) -> f32 {
    let band = 1.0 / HandCategory::COUNT as f32;
    let category = result.category as usize as f32;
    let primary = f32::from(result.tiebreaks.first().copied().unwrap_or(2));
    let within = ((primary - 2.0) / 12.0).clamp(0.0, 1.0);
    (category * band + within * band * 0.99).clamp(0.0, 1.0)
}

fn choose(
    pool: &[Card],
    start: usize,
    depth: usize,
    combo: &mut [Card; EVAL_HAND_SIZE],
    best: &mut Option<HandResult>,
) {
    if depth == EVAL_HAND_SIZE {
        resolve_jokers(combo, 0, best);
        return;
    }
    let remaining = EVAL_HAND_SIZE - depth - 1;
    for i in start..pool.len() - remaining {
        combo[depth] = pool[i];
        choose(pool, i + 1, depth + 1, combo, best);
    }
}

/// Brute-force joker resolution: at most two jokers times 52 substitutions
/// each, small enough to enumerate exhaustively.
fn resolve_jokers(
    combo: &mut [Card; EVAL_HAND_SIZE],
    from: usize,
    best: &mut Option<HandResult>,
) {
    match (from..EVAL_HAND_SIZE).find(|&i| combo[i].is_joker()) {
        None => {
            let result = classify_five(combo);
            if best.as_ref().is_none_or(|b| result > *b) {
                *best = Some(result);
            }
        }
        Some(i) => {
            for value in 2..=14u8 {
                for suit in Suit::REAL {
                    combo[i] = Card(value, suit);
                    resolve_jokers(combo, i + 1, best);
                }
            }
            combo[i] = Card::JOKER;
        }
    }
}

/// Classify five concrete cards. Joker substitution may have duplicated a
/// card, so identical cards are legal input here.
fn classify_five(cards: &[Card; EVAL_HAND_SIZE]) -> HandResult {
    // Rank multiplicities as (count, value), highest count then highest
    // value first.
    let mut counts: Vec<(usize, Value)> = Vec::with_capacity(EVAL_HAND_SIZE);
    for card in cards {
        match counts.iter_mut().find(|(_, v)| *v == card.0) {
            Some((n, _)) => *n += 1,
            None => counts.push((1, card.0)),
        }
    }
    counts.sort_unstable_by(|a, b| b.cmp(a));
    let shape: Vec<usize> = counts.iter().map(|(n, _)| *n).collect();

    let mut values: Vec<Value> = cards.iter().map(|c| c.0).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));

    let mut suits: Vec<Suit> = cards.iter().map(|c| c.1).collect();
    suits.sort_unstable();
    suits.dedup();
    let distinct_suits = suits.len();
    let is_flush = distinct_suits == 1;

    let straight = straight_high(&values);
    let skipping = skipping_high(&values);

    let result = |category, tiebreaks| HandResult {
        category,
        tiebreaks,
    };

    if shape == [5] {
        let rank = counts[0].1;
        return if is_flush {
            result(HandCategory::FlushFive, vec![rank])
        } else {
            result(HandCategory::FiveOfAKind, vec![rank])
        };
    }
    if is_flush {
        if let Some(high) = straight {
            return result(HandCategory::StraightFlush, vec![high]);
        }
    }
    if shape == [3, 2] {
        let tiebreaks = vec![counts[0].1, counts[1].1];
        return if is_flush {
            result(HandCategory::FlushHouse, tiebreaks)
        } else {
            result(HandCategory::FullHouse, tiebreaks)
        };
    }
    if shape == [4, 1] {
        return result(HandCategory::FourOfAKind, vec![counts[0].1, counts[1].1]);
    }
    if let Some(high) = straight {
        // Five sequential ranks wearing all four suits.
        if distinct_suits == 4 {
            return result(HandCategory::RainbowStraight, vec![high]);
        }
    }
    if is_flush {
        return result(HandCategory::Flush, values);
    }
    if let Some(high) = skipping {
        return result(HandCategory::SkippingStraight, vec![high]);
    }
    if let Some(high) = straight {
        return result(HandCategory::Straight, vec![high]);
    }
    if shape == [3, 1, 1] {
        let triple = counts[0].1;
        let hi = counts[1].1;
        let lo = counts[2].1;
        if is_three_run(triple, hi, lo) {
            return result(HandCategory::SandwichHand, vec![triple, hi, lo]);
        }
        return result(HandCategory::ThreeOfAKind, vec![triple, hi, lo]);
    }
    if shape == [2, 2, 1] {
        return result(
            HandCategory::TwoPair,
            vec![counts[0].1, counts[1].1, counts[2].1],
        );
    }
    if shape == [2, 1, 1, 1] {
        return result(
            HandCategory::OnePair,
            vec![counts[0].1, counts[1].1, counts[2].1, counts[3].1],
        );
    }
    result(HandCategory::HighCard, values)
}

/// High card of a straight formed by the five values, if any. Five
/// distinct consecutive ranks; the ace plays high or low (the wheel
/// A-2-3-4-5 ranks with high card 5).
fn straight_high(values: &[Value]) -> Option<Value> {
    let mut distinct = values.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() != EVAL_HAND_SIZE {
        return None;
    }
    if distinct.windows(2).all(|w| w[1] - w[0] == 1) {
        return Some(distinct[EVAL_HAND_SIZE - 1]);
    }
    if distinct == [2, 3, 4, 5, 14] {
        return Some(5);
    }
    None
}

/// High card of a skipping straight: five distinct ranks each two apart
/// (2-4-6-8-10 or 3-5-7-9-J). No ace-low form.
fn skipping_high(values: &[Value]) -> Option<Value> {
    let mut distinct = values.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() != EVAL_HAND_SIZE {
        return None;
    }
    if distinct.windows(2).all(|w| w[1] - w[0] == 2) {
        return Some(distinct[EVAL_HAND_SIZE - 1]);
    }
    None
}

/// Sandwich adjacency: the triple's rank and the two kicker ranks form a
/// run of three consecutive ranks, the triple sitting anywhere in it.
fn is_three_run(triple: Value, a: Value, b: Value) -> bool {
    let mut run = [triple, a, b];
    run.sort_unstable();
    run[1] - run[0] == 1 && run[2] - run[1] == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit::{Club, Diamond, Heart, Spade};

    fn result(category: HandCategory, tiebreaks: Vec<Value>) -> HandResult {
        HandResult {
            category,
            tiebreaks,
        }
    }

    // === Classification ===

    #[test]
    fn test_royal_straight_flush() {
        let pool = [
            Card(10, Spade),
            Card(11, Spade),
            Card(12, Spade),
            Card(13, Spade),
            Card(14, Spade),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::StraightFlush, vec![14])
        );
    }

    #[test]
    fn test_wheel_straight() {
        let pool = [
            Card(14, Spade),
            Card(2, Heart),
            Card(3, Diamond),
            Card(4, Club),
            Card(5, Spade),
        ];
        assert_eq!(eval(&pool).unwrap().category, HandCategory::Straight);
        assert_eq!(eval(&pool).unwrap().tiebreaks, vec![5]);
    }

    #[test]
    fn test_wheel_straight_flush() {
        let pool = [
            Card(14, Club),
            Card(2, Club),
            Card(3, Club),
            Card(4, Club),
            Card(5, Club),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::StraightFlush, vec![5])
        );
    }

    #[test]
    fn test_five_of_a_kind_with_joker() {
        let pool = [
            Card(7, Heart),
            Card(7, Diamond),
            Card(7, Club),
            Card(7, Spade),
            Card::JOKER,
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::FiveOfAKind, vec![7])
        );
    }

    #[test]
    fn test_sandwich_hand() {
        // Triple twos with 3 and 4: ranks 2-3-4 form a run.
        let pool = [
            Card(2, Club),
            Card(2, Diamond),
            Card(2, Heart),
            Card(3, Spade),
            Card(4, Spade),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::SandwichHand, vec![2, 4, 3])
        );
    }

    #[test]
    fn test_sandwich_requires_adjacency() {
        let pool = [
            Card(2, Club),
            Card(2, Diamond),
            Card(2, Heart),
            Card(5, Spade),
            Card(6, Spade),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::ThreeOfAKind, vec![2, 6, 5])
        );
    }

    #[test]
    fn test_sandwich_triple_in_middle() {
        // 7-8-9 run around triple eights.
        let pool = [
            Card(8, Club),
            Card(8, Diamond),
            Card(8, Heart),
            Card(7, Spade),
            Card(9, Spade),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::SandwichHand, vec![8, 9, 7])
        );
    }

    #[test]
    fn test_rainbow_straight() {
        let pool = [
            Card(5, Club),
            Card(6, Spade),
            Card(7, Diamond),
            Card(8, Heart),
            Card(9, Club),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::RainbowStraight, vec![9])
        );
    }

    #[test]
    fn test_three_suit_straight_is_plain() {
        let pool = [
            Card(5, Club),
            Card(6, Club),
            Card(7, Diamond),
            Card(8, Heart),
            Card(9, Club),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::Straight, vec![9])
        );
    }

    #[test]
    fn test_skipping_straight() {
        let pool = [
            Card(2, Club),
            Card(4, Spade),
            Card(6, Diamond),
            Card(8, Heart),
            Card(10, Club),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::SkippingStraight, vec![10])
        );
    }

    #[test]
    fn test_same_suit_skipping_ranks_as_flush() {
        // Flush outranks a skipping straight, so a single-suit run of twos
        // scores as the flush.
        let pool = [
            Card(2, Club),
            Card(4, Club),
            Card(6, Club),
            Card(8, Club),
            Card(10, Club),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::Flush, vec![10, 8, 6, 4, 2])
        );
    }

    #[test]
    fn test_flush_house_direct() {
        let cards = [
            Card(3, Heart),
            Card(3, Heart),
            Card(3, Heart),
            Card(5, Heart),
            Card(5, Heart),
        ];
        assert_eq!(
            classify_five(&cards),
            result(HandCategory::FlushHouse, vec![3, 5])
        );
    }

    #[test]
    fn test_flush_five_direct() {
        let cards = [Card(9, Diamond); 5];
        assert_eq!(
            classify_five(&cards),
            result(HandCategory::FlushFive, vec![9])
        );
    }

    #[test]
    fn test_standard_ladder() {
        let quad = [
            Card(9, Club),
            Card(9, Diamond),
            Card(9, Heart),
            Card(9, Spade),
            Card(2, Club),
        ];
        assert_eq!(
            eval(&quad).unwrap(),
            result(HandCategory::FourOfAKind, vec![9, 2])
        );

        let full = [
            Card(9, Club),
            Card(9, Diamond),
            Card(9, Heart),
            Card(2, Spade),
            Card(2, Club),
        ];
        assert_eq!(
            eval(&full).unwrap(),
            result(HandCategory::FullHouse, vec![9, 2])
        );

        let two_pair = [
            Card(9, Club),
            Card(9, Diamond),
            Card(4, Heart),
            Card(4, Spade),
            Card(2, Club),
        ];
        assert_eq!(
            eval(&two_pair).unwrap(),
            result(HandCategory::TwoPair, vec![9, 4, 2])
        );

        let pair = [
            Card(9, Club),
            Card(9, Diamond),
            Card(7, Heart),
            Card(4, Spade),
            Card(2, Club),
        ];
        assert_eq!(
            eval(&pair).unwrap(),
            result(HandCategory::OnePair, vec![9, 7, 4, 2])
        );

        let high = [
            Card(13, Club),
            Card(9, Diamond),
            Card(7, Heart),
            Card(4, Spade),
            Card(2, Club),
        ];
        assert_eq!(
            eval(&high).unwrap(),
            result(HandCategory::HighCard, vec![13, 9, 7, 4, 2])
        );
    }

    // === Pool search ===

    #[test]
    fn test_best_of_eight_card_pool() {
        // Flush in clubs hides inside a mixed pool.
        let pool = [
            Card(2, Club),
            Card(5, Club),
            Card(9, Club),
            Card(11, Club),
            Card(13, Club),
            Card(13, Heart),
            Card(13, Diamond),
            Card(4, Spade),
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::Flush, vec![13, 11, 9, 5, 2])
        );
    }

    #[test]
    fn test_order_independence() {
        let mut pool = vec![
            Card(10, Spade),
            Card(11, Spade),
            Card(12, Spade),
            Card(13, Spade),
            Card(14, Spade),
            Card(2, Heart),
            Card(7, Diamond),
        ];
        let forward = eval(&pool).unwrap();
        pool.reverse();
        assert_eq!(forward, eval(&pool).unwrap());
    }

    #[test]
    fn test_joker_upgrades_pool() {
        // Four spades plus a joker: the joker completes the flush, and the
        // straight flush outranks it.
        let pool = [
            Card(9, Spade),
            Card(10, Spade),
            Card(11, Spade),
            Card(12, Spade),
            Card::JOKER,
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::StraightFlush, vec![13])
        );
    }

    #[test]
    fn test_two_jokers() {
        let pool = [
            Card(14, Spade),
            Card(14, Heart),
            Card(14, Diamond),
            Card::JOKER,
            Card::JOKER,
        ];
        assert_eq!(
            eval(&pool).unwrap(),
            result(HandCategory::FiveOfAKind, vec![14])
        );
    }

    // === Errors ===

    #[test]
    fn test_insufficient_cards() {
        let pool = [Card(2, Club), Card(3, Club)];
        assert_eq!(
            eval(&pool).unwrap_err(),
            EvalError::InsufficientCards { got: 2 }
        );
    }

    #[test]
    fn test_duplicate_card_rejected() {
        let pool = [
            Card(2, Club),
            Card(2, Club),
            Card(5, Heart),
            Card(9, Diamond),
            Card(13, Spade),
        ];
        assert_eq!(
            eval(&pool).unwrap_err(),
            EvalError::InvalidHand {
                card: Card(2, Club)
            }
        );
    }

    #[test]
    fn test_two_jokers_not_duplicates() {
        let pool = [
            Card(2, Club),
            Card(5, Heart),
            Card(9, Diamond),
            Card::JOKER,
            Card::JOKER,
        ];
        assert!(eval(&pool).is_ok());
    }

    // === Ordering, ties, strength ===

    #[test]
    fn test_category_order() {
        assert!(HandCategory::HighCard < HandCategory::OnePair);
        assert!(HandCategory::ThreeOfAKind < HandCategory::SandwichHand);
        assert!(HandCategory::SandwichHand < HandCategory::Straight);
        assert!(HandCategory::Straight < HandCategory::SkippingStraight);
        assert!(HandCategory::SkippingStraight < HandCategory::Flush);
        assert!(HandCategory::Flush < HandCategory::RainbowStraight);
        assert!(HandCategory::RainbowStraight < HandCategory::FullHouse);
        assert!(HandCategory::FourOfAKind < HandCategory::FlushHouse);
        assert!(HandCategory::FlushHouse < HandCategory::StraightFlush);
        assert!(HandCategory::StraightFlush < HandCategory::FiveOfAKind);
        assert!(HandCategory::FiveOfAKind < HandCategory::FlushFive);
    }

    #[test]
    fn test_tiebreak_within_category() {
        let quad_nines = result(HandCategory::FourOfAKind, vec![9, 2]);
        let quad_eights = result(HandCategory::FourOfAKind, vec![8, 14]);
        assert!(quad_nines > quad_eights);

        let better_kicker = result(HandCategory::FourOfAKind, vec![9, 5]);
        assert!(better_kicker > quad_nines);
    }

    #[test]
    fn test_argmax_single_winner() {
        let a = result(HandCategory::Flush, vec![13, 11, 9, 5, 2]);
        let b = result(HandCategory::Straight, vec![9]);
        assert_eq!(argmax(&[a, b]), vec![0]);
    }

    #[test]
    fn test_argmax_ties() {
        let a = result(HandCategory::OnePair, vec![9, 7, 4, 2]);
        assert_eq!(argmax(&[a.clone(), a.clone(), a]), vec![0, 1, 2]);
    }

    #[test]
    fn test_argmax_empty() {
        assert!(argmax(&[]).is_empty());
    }

    #[test]
    fn test_hand_strength_bounds_and_monotonicity() {
        let weak = result(HandCategory::HighCard, vec![7, 5, 4, 3, 2]);
        let pair = result(HandCategory::OnePair, vec![14, 13, 12, 11]);
        let top = result(HandCategory::FlushFive, vec![14]);

        let ws = hand_strength(&weak);
        let ps = hand_strength(&pair);
        let ts = hand_strength(&top);
        assert!((0.0..=1.0).contains(&ws));
        assert!((0.0..=1.0).contains(&ts));
        assert!(ws < ps);
        assert!(ps < ts);
    }

    #[test]
    fn test_hand_strength_respects_tiebreak() {
        let aces = result(HandCategory::OnePair, vec![14, 13, 12, 11]);
        let twos = result(HandCategory::OnePair, vec![2, 14, 13, 12]);
        assert!(hand_strength(&twos) < hand_strength(&aces));
        // Never crosses into the next category's band.
        let two_pair = result(HandCategory::TwoPair, vec![2, 3, 4]);
        assert!(hand_strength(&aces) < hand_strength(&two_pair));
    }
}
